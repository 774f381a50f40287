//! Fixed-size SPL account layouts.
//!
//! Token-2022 accounts share the classic prefix and append an account-type
//! byte plus TLV extensions after [`TLV_START`].

use chainmeta_error::{ChainMetaError, Result};

/// Size of the base mint layout
pub const MINT_LEN: usize = 82;
/// Size of the base token-account layout
pub const TOKEN_ACCOUNT_LEN: usize = 165;
/// Offset of the first TLV entry in an extended account
pub const TLV_START: usize = 166;

fn slice<'a>(data: &'a [u8], what: &str, start: usize, len: usize) -> Result<&'a [u8]> {
    data.get(start..start + len).ok_or_else(|| {
        ChainMetaError::decode(
            what,
            format!("need {} bytes at offset {start}, have {}", len, data.len()),
        )
    })
}

fn read_u64(data: &[u8], what: &str, offset: usize) -> Result<u64> {
    let bytes: [u8; 8] = slice(data, what, offset, 8)?
        .try_into()
        .map_err(|_| ChainMetaError::decode(what, "u64 slice"))?;
    Ok(u64::from_le_bytes(bytes))
}

fn read_pubkey(data: &[u8], what: &str, offset: usize) -> Result<[u8; 32]> {
    slice(data, what, offset, 32)?
        .try_into()
        .map_err(|_| ChainMetaError::decode(what, "pubkey slice"))
}

/// The fields of an SPL mint we care about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintLayout {
    /// Total supply in base units
    pub supply: u64,
    /// Decimal precision
    pub decimals: u8,
    /// Initialisation flag
    pub is_initialized: bool,
}

impl MintLayout {
    /// Decodes the base mint layout from raw account data
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < MINT_LEN {
            return Err(ChainMetaError::decode(
                "mint",
                format!("account is {} bytes, expected at least {MINT_LEN}", data.len()),
            ));
        }
        Ok(Self {
            supply: read_u64(data, "mint", 36)?,
            decimals: data[44],
            is_initialized: data[45] != 0,
        })
    }

    /// True if the account carries extension data past the base layout
    pub fn has_extensions(data: &[u8]) -> bool {
        data.len() > TLV_START
    }
}

/// The fields of an SPL token account we care about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountLayout {
    /// Mint the account holds
    pub mint: [u8; 32],
    /// Wallet that owns the account
    pub owner: [u8; 32],
    /// Balance in base units
    pub amount: u64,
    /// Delegate, if one is set
    pub delegate: Option<[u8; 32]>,
    /// Amount the delegate may transfer
    pub delegated_amount: u64,
}

impl TokenAccountLayout {
    /// Decodes the base token-account layout from raw account data
    pub fn decode(data: &[u8]) -> Result<Self> {
        const WHAT: &str = "token account";
        if data.len() < TOKEN_ACCOUNT_LEN {
            return Err(ChainMetaError::decode(
                WHAT,
                format!(
                    "account is {} bytes, expected at least {TOKEN_ACCOUNT_LEN}",
                    data.len()
                ),
            ));
        }
        let delegate_tag = slice(data, WHAT, 72, 4)?;
        let delegate = if delegate_tag.iter().any(|b| *b != 0) {
            Some(read_pubkey(data, WHAT, 76)?)
        } else {
            None
        };
        Ok(Self {
            mint: read_pubkey(data, WHAT, 0)?,
            owner: read_pubkey(data, WHAT, 32)?,
            amount: read_u64(data, WHAT, 64)?,
            delegate,
            delegated_amount: read_u64(data, WHAT, 121)?,
        })
    }
}
