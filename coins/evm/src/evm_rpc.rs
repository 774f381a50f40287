//! [`ChainRpc`] for account-model EVM chains.

use std::sync::Arc;

use alloy::primitives::U256;
use async_trait::async_trait;
use chainmeta_error::Result;
use chainmeta_resilience::RpcContext;
use chainmeta_traits::{
    is_zero_hex, resolve_token_info, BackendKind, ChainConfig, ChainRpc, TokenInfo, TokenInfoCache,
    TxStatus,
};

use crate::evmclient::{parse_address, EvmClient};

/// EVM implementation of the chain-RPC contract
#[derive(Debug, Clone)]
pub struct EvmRpc {
    chain: Arc<ChainConfig>,
    client: Arc<EvmClient>,
    tokens: TokenInfoCache,
}

impl EvmRpc {
    /// Binds a chain, its client handle and the shared token cache
    pub fn new(chain: Arc<ChainConfig>, client: Arc<EvmClient>, tokens: TokenInfoCache) -> Self {
        Self {
            chain,
            client,
            tokens,
        }
    }

    /// Raw client handle
    pub fn client(&self) -> &Arc<EvmClient> {
        &self.client
    }

    async fn balance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        block: Option<u64>,
    ) -> Result<U256> {
        if is_zero_hex(token) {
            self.client.native_balance(ctx, owner, block).await
        } else {
            self.client.token_balance(ctx, owner, token, block).await
        }
    }
}

#[async_trait]
impl ChainRpc for EvmRpc {
    fn backend(&self) -> BackendKind {
        self.chain.backend
    }

    fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    async fn get_token_info(&self, ctx: &RpcContext, address: &str) -> Result<TokenInfo> {
        let native = is_zero_hex(address);
        // lowercase hex so checksummed and plain spellings share one entry
        let cache_address = if native {
            address.to_string()
        } else {
            format!("{:#x}", parse_address(address)?)
        };
        resolve_token_info(&self.chain, &self.tokens, address, &cache_address, native, || {
            self.client.fetch_token_info(ctx, &self.chain, address)
        })
        .await
    }

    async fn get_balance(&self, ctx: &RpcContext, owner: &str, token: &str) -> Result<U256> {
        self.balance(ctx, owner, token, None).await
    }

    async fn get_balance_at(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        block: u64,
    ) -> Result<U256> {
        self.balance(ctx, owner, token, Some(block)).await
    }

    async fn get_allowance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        spender: &str,
    ) -> Result<U256> {
        self.client.allowance(ctx, owner, token, spender).await
    }

    async fn is_transaction_successful(&self, ctx: &RpcContext, hash: &str) -> Result<TxStatus> {
        self.client.transaction_status(ctx, hash).await
    }

    async fn get_latest_block_height(&self, ctx: &RpcContext) -> Result<u64> {
        self.client.block_number(ctx).await
    }
}
