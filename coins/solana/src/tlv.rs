//! Token-2022 type-length-value extension scanning.

use chainmeta_error::{ChainMetaError, Result};

/// Extension type of embedded token metadata
pub const TOKEN_METADATA_EXTENSION: u16 = 19;

const HEADER_LEN: usize = 4;

/// Returns the payload of the first entry of type `wanted`, if any.
///
/// Entries are `u16` type, `u16` length (both little-endian) and then the
/// payload. A zero type marks trailing padding and ends the scan.
///
/// # Errors
///
/// An entry whose length runs past the end of `data` is a decode error.
pub fn find_extension(data: &[u8], wanted: u16) -> Result<Option<&[u8]>> {
    let mut offset = 0;
    while offset + HEADER_LEN <= data.len() {
        let kind = u16::from_le_bytes([data[offset], data[offset + 1]]);
        let len = u16::from_le_bytes([data[offset + 2], data[offset + 3]]) as usize;
        if kind == 0 {
            break;
        }
        let start = offset + HEADER_LEN;
        let payload = data.get(start..start + len).ok_or_else(|| {
            ChainMetaError::decode(
                "tlv",
                format!("extension {kind} claims {len} bytes at offset {start}, have {}", data.len()),
            )
        })?;
        if kind == wanted {
            return Ok(Some(payload));
        }
        offset = start + len;
    }
    Ok(None)
}

#[cfg(test)]
pub(crate) fn entry(kind: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    out
}
