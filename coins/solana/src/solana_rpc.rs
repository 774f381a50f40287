//! [`ChainRpc`] for Solana.

use std::sync::Arc;

use async_trait::async_trait;
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_resilience::RpcContext;
use chainmeta_traits::{
    resolve_token_info, BackendKind, ChainConfig, ChainRpc, TokenInfo, TokenInfoCache, TxStatus,
    U256,
};

use crate::address::{is_native_address, parse_pubkey};
use crate::solana_client::SolanaClient;
use crate::source::{self, AccountSource};

/// Solana implementation of the chain-RPC contract.
///
/// Generic over the account source so the same flows run against a live
/// node or a fixed account set.
pub struct SolanaRpc<S: AccountSource + ?Sized = SolanaClient> {
    chain: Arc<ChainConfig>,
    client: Arc<S>,
    tokens: TokenInfoCache,
}

impl<S: AccountSource + ?Sized> Clone for SolanaRpc<S> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            client: Arc::clone(&self.client),
            tokens: self.tokens.clone(),
        }
    }
}

impl<S: AccountSource + ?Sized> std::fmt::Debug for SolanaRpc<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("chain", &self.chain.name)
            .finish()
    }
}

impl<S: AccountSource + ?Sized> SolanaRpc<S> {
    /// Binds a chain, its client handle and the shared token cache
    pub fn new(chain: Arc<ChainConfig>, client: Arc<S>, tokens: TokenInfoCache) -> Self {
        Self {
            chain,
            client,
            tokens,
        }
    }

    /// Raw client handle
    pub fn client(&self) -> &Arc<S> {
        &self.client
    }
}

impl SolanaRpc<SolanaClient> {
    async fn signature_status(&self, ctx: &RpcContext, hash: &str) -> Result<TxStatus> {
        self.client.transaction_status(ctx, hash).await
    }

    async fn head(&self, ctx: &RpcContext) -> Result<u64> {
        self.client.finalized_slot(ctx).await
    }
}

impl<S: AccountSource + ?Sized> SolanaRpc<S> {
    async fn token_info(&self, ctx: &RpcContext, address: &str) -> Result<TokenInfo> {
        let native = is_native_address(address);
        let cache_address = if native {
            address.trim().to_string()
        } else {
            parse_pubkey(address)?.to_string()
        };
        resolve_token_info(&self.chain, &self.tokens, address, &cache_address, native, || {
            source::fetch_token_info(self.client.as_ref(), ctx, &self.chain, address)
        })
        .await
    }

    async fn balance(&self, ctx: &RpcContext, owner: &str, token: &str) -> Result<U256> {
        if is_native_address(token) {
            source::native_balance(self.client.as_ref(), ctx, owner).await
        } else {
            source::token_balance(self.client.as_ref(), ctx, owner, token).await
        }
    }

    async fn allowance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        spender: &str,
    ) -> Result<U256> {
        if is_native_address(token) {
            // lamports cannot be delegated
            return Ok(U256::ZERO);
        }
        source::token_allowance(self.client.as_ref(), ctx, owner, token, spender).await
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc<SolanaClient> {
    fn backend(&self) -> BackendKind {
        BackendKind::Solana
    }

    fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    async fn get_token_info(&self, ctx: &RpcContext, address: &str) -> Result<TokenInfo> {
        self.token_info(ctx, address).await
    }

    async fn get_balance(&self, ctx: &RpcContext, owner: &str, token: &str) -> Result<U256> {
        self.balance(ctx, owner, token).await
    }

    async fn get_balance_at(
        &self,
        _ctx: &RpcContext,
        _owner: &str,
        _token: &str,
        _block: u64,
    ) -> Result<U256> {
        Err(ChainMetaError::unsupported(
            BackendKind::Solana,
            "get_balance_at",
        ))
    }

    async fn get_allowance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        spender: &str,
    ) -> Result<U256> {
        self.allowance(ctx, owner, token, spender).await
    }

    async fn is_transaction_successful(&self, ctx: &RpcContext, hash: &str) -> Result<TxStatus> {
        self.signature_status(ctx, hash).await
    }

    async fn get_latest_block_height(&self, ctx: &RpcContext) -> Result<u64> {
        self.head(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::metadata_address;
    use crate::layout::fixtures::mint;
    use crate::metadata::fixtures::metaplex;
    use crate::source::memory::MemorySource;
    use chainmeta_cache::{loader_fn, CacheConfig, RefreshAheadCache};
    use chainmeta_traits::ChainRow;

    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const OWNER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn rpc(source: MemorySource) -> SolanaRpc<MemorySource> {
        let chain = ChainConfig::from_row(ChainRow {
            id: 9,
            chain_id: "solana".into(),
            name: "solana".into(),
            alias_name: "Solana".into(),
            backend: 3,
            explorer_url: "https://solscan.io".into(),
            gas_token_name: "SOL".into(),
            gas_token_decimal: 9,
            ..ChainRow::default()
        })
        .unwrap();
        let tokens = RefreshAheadCache::new(
            "onchain",
            CacheConfig::default(),
            loader_fn(|key: String| async move {
                Err(ChainMetaError::TokenNotFound {
                    chain: String::new(),
                    address: key,
                })
            }),
        )
        .unwrap();
        SolanaRpc::new(Arc::new(chain), Arc::new(source), tokens)
    }

    #[tokio::test]
    async fn test_token_info_is_cached() {
        let mut source = MemorySource::default();
        let mint_key = parse_pubkey(MINT).unwrap();
        source.accounts.insert(mint_key, mint(100, 6));
        source
            .accounts
            .insert(metadata_address(&mint_key), metaplex("USD Coin", "USDC", ""));
        let rpc = rpc(source);
        let ctx = RpcContext::background();

        let first = rpc.token_info(&ctx, MINT).await.unwrap();
        let second = rpc.token_info(&ctx, &format!(" {MINT}")).await.unwrap();
        assert_eq!(first.name, "USDC");
        assert_eq!(second.name, "USDC");
        assert_eq!(rpc.client().calls(), 1);
        assert!(rpc.tokens.contains_key(&format!("solana#{MINT}")));
    }

    #[tokio::test]
    async fn test_native_sentinels_skip_network() {
        let rpc = rpc(MemorySource::default());
        let ctx = RpcContext::background();
        for sentinel in ["11111111111111111111111111111111", "0x0000000000000000000000000000000000000000"] {
            let info = rpc.token_info(&ctx, sentinel).await.unwrap();
            assert_eq!(info.name, "SOL");
            assert_eq!(info.decimals, 9);
            assert_eq!(info.url.as_deref(), Some("https://solscan.io"));
        }
        assert_eq!(rpc.client().calls(), 0);
        assert!(rpc.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_native_balance_uses_lamports() {
        let mut source = MemorySource::default();
        source.lamports.insert(parse_pubkey(OWNER).unwrap(), 7);
        let rpc = rpc(source);
        let ctx = RpcContext::background();
        let balance = rpc
            .balance(&ctx, OWNER, "11111111111111111111111111111111")
            .await
            .unwrap();
        assert_eq!(balance, U256::from(7u64));
        let allowance = rpc
            .allowance(&ctx, OWNER, "0x0", OWNER)
            .await
            .unwrap();
        assert_eq!(allowance, U256::ZERO);
    }

    #[tokio::test]
    async fn test_failed_resolution_not_cached() {
        let rpc = rpc(MemorySource::default());
        let ctx = RpcContext::background();
        assert!(rpc.token_info(&ctx, MINT).await.unwrap_err().is_not_found());
        assert!(rpc.token_info(&ctx, MINT).await.is_err());
        assert_eq!(rpc.client().calls(), 2);
        assert!(rpc.tokens.is_empty());
    }
}
