//! ERC-20 bindings and decoding of the metadata batch.

use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy::sol_types::{sol_data, SolCall, SolType};
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_traits::{ChainConfig, TokenInfo};

// Creates Rust bindings for the read-only part of the ERC20 ABI
sol! {
    #[sol(rpc)]
    contract ERC20 {
        function name() public view returns (string memory);
        function symbol() public view returns (string memory);
        function decimals() public view returns (uint8);
        function totalSupply() public view returns (uint256);
        function balanceOf(address account) public view returns (uint256);
        function allowance(address owner, address spender) public view returns (uint256);
    }
}

/// Raw `eth_call` results of the four metadata calls
#[derive(Debug, Clone, Default)]
pub struct Erc20Returns {
    /// `symbol()` return data
    pub symbol: Bytes,
    /// `decimals()` return data
    pub decimals: Bytes,
    /// `name()` return data
    pub name: Bytes,
    /// `totalSupply()` return data
    pub total_supply: Bytes,
}

/// Calldata for `symbol()`, `decimals()`, `name()`, `totalSupply()` in that order
pub fn metadata_calldata() -> [Bytes; 4] {
    [
        ERC20::symbolCall {}.abi_encode().into(),
        ERC20::decimalsCall {}.abi_encode().into(),
        ERC20::nameCall {}.abi_encode().into(),
        ERC20::totalSupplyCall {}.abi_encode().into(),
    ]
}

/// Decodes a string return, accepting the `bytes32` form some older tokens use.
///
/// Empty return data decodes to an empty string.
fn decode_string(what: &str, data: &Bytes) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }
    if let Ok(value) = ERC20::symbolCall::abi_decode_returns(data) {
        return Ok(value);
    }
    if data.len() == 32 {
        let end = data.iter().position(|b| *b == 0).unwrap_or(32);
        return std::str::from_utf8(&data[..end])
            .map(str::to_string)
            .map_err(|e| ChainMetaError::decode(what, e));
    }
    Err(ChainMetaError::decode(
        what,
        format!("unexpected {} byte return", data.len()),
    ))
}

/// Reads the full word; some non-standard tokens return more than a `uint8`.
fn decode_decimals(data: &Bytes) -> Result<U256> {
    if data.is_empty() {
        return Ok(U256::ZERO);
    }
    sol_data::Uint::<256>::abi_decode(data).map_err(|e| ChainMetaError::decode("decimals", e))
}

fn decode_total_supply(data: &Bytes) -> Result<U256> {
    if data.is_empty() {
        return Ok(U256::ZERO);
    }
    ERC20::totalSupplyCall::abi_decode_returns(data)
        .map_err(|e| ChainMetaError::decode("totalSupply", e))
}

/// Builds token info from the batch results.
///
/// A contract that reports zero decimals, more than 255 decimals or an empty
/// symbol is treated as not being an ERC-20 token. This also rejects real
/// zero-decimal tokens.
///
/// # Errors
///
/// [`ChainMetaError::TokenNotFound`] for the rejection above and
/// [`ChainMetaError::Decode`] for malformed return data.
pub fn token_info_from_returns(
    chain: &ChainConfig,
    address: &str,
    returns: &Erc20Returns,
) -> Result<TokenInfo> {
    let symbol = decode_string("symbol", &returns.symbol)?;
    let decimals = decode_decimals(&returns.decimals)?;
    let not_found = || ChainMetaError::TokenNotFound {
        chain: chain.name.clone(),
        address: address.to_string(),
    };
    let decimals = match u8::try_from(decimals) {
        Ok(decimals) if decimals > 0 => decimals,
        _ => return Err(not_found()),
    };
    if symbol.trim().is_empty() {
        return Err(not_found());
    }

    let name = decode_string("name", &returns.name)?;
    let total_supply = decode_total_supply(&returns.total_supply)?;

    Ok(TokenInfo {
        name: symbol.trim().to_string(),
        chain_name: chain.name.clone(),
        address: address.to_string(),
        decimals,
        full_name: name.trim().to_string(),
        total_supply,
        url: Some(chain.explorer_url.clone()).filter(|u| !u.is_empty()),
    })
}
