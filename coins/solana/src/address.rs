//! Well-known program ids and program-derived addresses.

use std::str::FromStr;

use chainmeta_error::{ChainMetaError, Result};
use chainmeta_traits::is_zero_hex;
use solana_sdk::pubkey::Pubkey;

/// System program, also used as the native SOL sentinel
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::from_str_const("11111111111111111111111111111111");
/// SPL Token program
pub const TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
/// SPL Token-2022 program
pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
/// Associated Token Account program
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
/// Metaplex token metadata program
pub const METADATA_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Parses a base58 public key, reporting failures as decode errors
pub fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address.trim()).map_err(|e| ChainMetaError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// True for the hex zero sentinel or the system program id
pub fn is_native_address(address: &str) -> bool {
    let address = address.trim();
    is_zero_hex(address) || address == SYSTEM_PROGRAM_ID.to_string()
}

/// Metaplex metadata account for `mint`
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[b"metadata", METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &METADATA_PROGRAM_ID,
    )
    .0
}

/// Associated token account of `owner` for `mint` under `token_program`
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainmeta_error::ErrorKind;

    const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const OWNER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    #[test]
    fn test_parse_pubkey() {
        assert!(parse_pubkey(USDC_MINT).is_ok());
        assert!(parse_pubkey(&format!(" {USDC_MINT} ")).is_ok());
        let err = parse_pubkey("0xdeadbeef").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_native_sentinels() {
        assert!(is_native_address("11111111111111111111111111111111"));
        assert!(is_native_address("0x0000000000000000000000000000000000000000"));
        assert!(!is_native_address(USDC_MINT));
    }

    #[test]
    fn test_program_ids_roundtrip() {
        assert_eq!(
            TOKEN_PROGRAM_ID.to_string(),
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        );
        assert_eq!(
            METADATA_PROGRAM_ID.to_string(),
            "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s"
        );
    }

    #[test]
    fn test_derivations_are_deterministic() {
        let mint = parse_pubkey(USDC_MINT).unwrap();
        let owner = parse_pubkey(OWNER).unwrap();

        assert_eq!(metadata_address(&mint), metadata_address(&mint));
        let classic = associated_token_address(&owner, &mint, &TOKEN_PROGRAM_ID);
        let extended = associated_token_address(&owner, &mint, &TOKEN_2022_PROGRAM_ID);
        assert_eq!(classic, associated_token_address(&owner, &mint, &TOKEN_PROGRAM_ID));
        assert_ne!(classic, extended);
        assert_ne!(classic, metadata_address(&mint));
    }
}
