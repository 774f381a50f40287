//! Account reads and the resolution flows built on top of them.
//!
//! Everything here is written against [`AccountSource`] so the decoding
//! paths can be driven by an in-memory account set as well as a live node.

use async_trait::async_trait;
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_resilience::RpcContext;
use chainmeta_traits::{ChainConfig, TokenInfo, U256};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::address::{
    associated_token_address, metadata_address, parse_pubkey, TOKEN_2022_PROGRAM_ID,
    TOKEN_PROGRAM_ID,
};
use crate::layout::{MintLayout, TokenAccountLayout, TLV_START};
use crate::metadata::{decode_metaplex, decode_token_metadata_extension, TokenIdentity};
use crate::tlv::{find_extension, TOKEN_METADATA_EXTENSION};

/// Raw account access
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Data of each account in `keys`, `None` for accounts that do not exist.
    /// The result has the same length and order as `keys`.
    async fn account_data(&self, ctx: &RpcContext, keys: &[Pubkey]) -> Result<Vec<Option<Vec<u8>>>>;

    /// Lamport balance of `key`; zero for accounts that do not exist
    async fn lamports(&self, ctx: &RpcContext, key: &Pubkey) -> Result<u64>;
}

/// Resolves mint metadata for `address`.
///
/// The metadata account and the mint are fetched in one round trip. A mint
/// with embedded Token-2022 metadata overrides whatever the Metaplex record
/// says; a mint with neither gets the `UNKNOWN` placeholder identity.
///
/// # Errors
///
/// [`ChainMetaError::TokenNotFound`] if the mint account does not exist, a
/// decode error if any record is malformed, and transport errors from the
/// source.
pub async fn fetch_token_info<S>(
    source: &S,
    ctx: &RpcContext,
    chain: &ChainConfig,
    address: &str,
) -> Result<TokenInfo>
where
    S: AccountSource + ?Sized,
{
    let mint = parse_pubkey(address)?;
    let metadata_key = metadata_address(&mint);

    let mut accounts = source
        .account_data(ctx, &[metadata_key, mint])
        .await?
        .into_iter();
    let metadata = accounts.next().flatten();
    let mint_data = accounts
        .next()
        .flatten()
        .ok_or_else(|| ChainMetaError::TokenNotFound {
            chain: chain.name.clone(),
            address: address.to_string(),
        })?;

    let layout = MintLayout::decode(&mint_data)?;
    let mut identity = match metadata {
        Some(data) => decode_metaplex(&data)?,
        None => {
            debug!(chain = %chain.name, %mint, "no metaplex metadata account");
            TokenIdentity::unknown()
        }
    };

    if MintLayout::has_extensions(&mint_data) {
        if let Some(payload) = find_extension(&mint_data[TLV_START..], TOKEN_METADATA_EXTENSION)? {
            identity = decode_token_metadata_extension(payload)?;
        }
    }

    Ok(TokenInfo {
        name: identity.symbol,
        chain_name: chain.name.clone(),
        address: address.trim().to_string(),
        decimals: layout.decimals,
        full_name: identity.name,
        total_supply: U256::from(layout.supply),
        url: identity.uri,
    })
}

/// Reads the owner's associated token account for `mint`.
///
/// Both the classic and Token-2022 associated accounts are requested in one
/// call; the first that exists wins. `Ok(None)` means the owner holds no
/// account for this mint.
pub async fn fetch_token_account<S>(
    source: &S,
    ctx: &RpcContext,
    owner: &str,
    mint: &str,
) -> Result<Option<TokenAccountLayout>>
where
    S: AccountSource + ?Sized,
{
    let owner = parse_pubkey(owner)?;
    let mint = parse_pubkey(mint)?;
    let candidates = [
        associated_token_address(&owner, &mint, &TOKEN_PROGRAM_ID),
        associated_token_address(&owner, &mint, &TOKEN_2022_PROGRAM_ID),
    ];

    let found = source
        .account_data(ctx, &candidates)
        .await?
        .into_iter()
        .flatten()
        .next();
    match found {
        Some(data) => {
            let layout = TokenAccountLayout::decode(&data)?;
            if layout.mint != mint.to_bytes() {
                warn!(%owner, %mint, "associated account holds a different mint");
            }
            Ok(Some(layout))
        }
        None => Ok(None),
    }
}

/// SPL balance of `owner` in `mint`, zero when the account does not exist
pub async fn token_balance<S>(source: &S, ctx: &RpcContext, owner: &str, mint: &str) -> Result<U256>
where
    S: AccountSource + ?Sized,
{
    let account = fetch_token_account(source, ctx, owner, mint).await?;
    Ok(U256::from(account.map_or(0, |a| a.amount)))
}

/// Delegated amount on `owner`'s token account, zero when there is none.
///
/// SPL accounts carry a single delegate; the amount is reported only when it
/// is `spender`.
pub async fn token_allowance<S>(
    source: &S,
    ctx: &RpcContext,
    owner: &str,
    mint: &str,
    spender: &str,
) -> Result<U256>
where
    S: AccountSource + ?Sized,
{
    let spender = parse_pubkey(spender)?;
    let account = fetch_token_account(source, ctx, owner, mint).await?;
    let amount = match account {
        Some(layout) if layout.delegate == Some(spender.to_bytes()) => layout.delegated_amount,
        _ => 0,
    };
    Ok(U256::from(amount))
}

/// Lamport balance of `owner`
pub async fn native_balance<S>(source: &S, ctx: &RpcContext, owner: &str) -> Result<U256>
where
    S: AccountSource + ?Sized,
{
    let owner = parse_pubkey(owner)?;
    Ok(U256::from(source.lamports(ctx, &owner).await?))
}
