//! Borsh-encoded token metadata records.
//!
//! Only the leading fields are declared; trailing data (creators, collection,
//! additional metadata) is left unread.

use borsh::BorshDeserialize;
use chainmeta_error::{ChainMetaError, Result};

/// Symbol and name used when a mint has no metadata at all
pub const UNKNOWN: &str = "UNKNOWN";

/// Display identity of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    /// Ticker symbol
    pub symbol: String,
    /// Human-readable name
    pub name: String,
    /// Off-chain metadata URI, if set
    pub uri: Option<String>,
}

impl TokenIdentity {
    /// Placeholder identity for mints without metadata
    pub fn unknown() -> Self {
        Self {
            symbol: UNKNOWN.to_string(),
            name: UNKNOWN.to_string(),
            uri: None,
        }
    }

    fn from_fields(name: String, symbol: String, uri: String) -> Self {
        let uri = clean(uri);
        Self {
            symbol: clean(symbol),
            name: clean(name),
            uri: Some(uri).filter(|u| !u.is_empty()),
        }
    }
}

// Metaplex pads strings to fixed widths with NULs.
fn clean(value: String) -> String {
    value.trim_end_matches('\0').trim().to_string()
}

#[derive(BorshDeserialize)]
struct MetaplexPrefix {
    _key: u8,
    _update_authority: [u8; 32],
    _mint: [u8; 32],
    name: String,
    symbol: String,
    uri: String,
}

#[derive(BorshDeserialize)]
struct Token2022Prefix {
    _update_authority: [u8; 32],
    _mint: [u8; 32],
    name: String,
    symbol: String,
    uri: String,
}

/// Decodes a Metaplex metadata account
pub fn decode_metaplex(data: &[u8]) -> Result<TokenIdentity> {
    let record = MetaplexPrefix::deserialize(&mut &data[..])
        .map_err(|e| ChainMetaError::decode("metaplex metadata", e))?;
    Ok(TokenIdentity::from_fields(record.name, record.symbol, record.uri))
}

/// Decodes the Token-2022 embedded metadata extension payload
pub fn decode_token_metadata_extension(data: &[u8]) -> Result<TokenIdentity> {
    let record = Token2022Prefix::deserialize(&mut &data[..])
        .map_err(|e| ChainMetaError::decode("token metadata extension", e))?;
    Ok(TokenIdentity::from_fields(record.name, record.symbol, record.uri))
}

#[cfg(test)]
pub(crate) mod fixtures {
    fn push_string(out: &mut Vec<u8>, value: &str) {
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(value.as_bytes());
    }

    pub fn metaplex(name: &str, symbol: &str, uri: &str) -> Vec<u8> {
        let mut out = vec![4u8];
        out.extend_from_slice(&[1u8; 32]);
        out.extend_from_slice(&[2u8; 32]);
        push_string(&mut out, name);
        push_string(&mut out, symbol);
        push_string(&mut out, uri);
        // seller fee and a trailing creators option the decoder never reads
        out.extend_from_slice(&500u16.to_le_bytes());
        out.push(0);
        out
    }

    pub fn extension(name: &str, symbol: &str, uri: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&[1u8; 32]);
        out.extend_from_slice(&[2u8; 32]);
        push_string(&mut out, name);
        push_string(&mut out, symbol);
        push_string(&mut out, uri);
        out.extend_from_slice(&0u32.to_le_bytes());
        out
    }
}
