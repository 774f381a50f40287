//! Backend dispatch over the chain-RPC variants.

use async_trait::async_trait;
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_evm::EvmRpc;
use chainmeta_provider::BackendClient;
use chainmeta_registry::ChainEntry;
use chainmeta_resilience::RpcContext;
use chainmeta_solana::SolanaRpc;
use chainmeta_traits::{BackendKind, ChainConfig, ChainRpc, TokenInfo, TokenInfoCache, TxStatus, U256};
use std::sync::Arc;

/// The chain-RPC implementation for one registry entry
#[derive(Debug, Clone)]
pub enum ChainRpcClient {
    /// EVM chains
    Evm(EvmRpc),
    /// Solana
    Solana(SolanaRpc),
}

impl ChainRpcClient {
    /// Picks the variant matching the entry's client handle.
    ///
    /// # Errors
    ///
    /// [`ChainMetaError::Unsupported`] for disabled chains and for backends
    /// without a chain-RPC variant.
    pub fn for_entry(entry: &ChainEntry, tokens: TokenInfoCache) -> Result<Self> {
        let config = Arc::clone(&entry.config);
        match &entry.client {
            BackendClient::Evm(client) => Ok(Self::Evm(EvmRpc::new(config, Arc::clone(client), tokens))),
            BackendClient::Solana(client) => {
                Ok(Self::Solana(SolanaRpc::new(config, Arc::clone(client), tokens)))
            }
            BackendClient::Detached if config.disabled => Err(ChainMetaError::unsupported(
                config.backend,
                format!("rpc on disabled chain {}", config.name),
            )),
            _ => Err(ChainMetaError::unsupported(config.backend, "chain rpc")),
        }
    }

    /// The raw backend client handle
    pub fn backend_client(&self) -> BackendClient {
        match self {
            Self::Evm(rpc) => BackendClient::Evm(Arc::clone(rpc.client())),
            Self::Solana(rpc) => BackendClient::Solana(Arc::clone(rpc.client())),
        }
    }

    fn inner(&self) -> &dyn ChainRpc {
        match self {
            Self::Evm(rpc) => rpc,
            Self::Solana(rpc) => rpc,
        }
    }
}

#[async_trait]
impl ChainRpc for ChainRpcClient {
    fn backend(&self) -> BackendKind {
        self.inner().backend()
    }

    fn chain(&self) -> &ChainConfig {
        self.inner().chain()
    }

    async fn get_token_info(&self, ctx: &RpcContext, address: &str) -> Result<TokenInfo> {
        self.inner().get_token_info(ctx, address).await
    }

    async fn get_balance(&self, ctx: &RpcContext, owner: &str, token: &str) -> Result<U256> {
        self.inner().get_balance(ctx, owner, token).await
    }

    async fn get_balance_at(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        block: u64,
    ) -> Result<U256> {
        self.inner().get_balance_at(ctx, owner, token, block).await
    }

    async fn get_allowance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        spender: &str,
    ) -> Result<U256> {
        self.inner().get_allowance(ctx, owner, token, spender).await
    }

    async fn is_transaction_successful(&self, ctx: &RpcContext, hash: &str) -> Result<TxStatus> {
        self.inner().is_transaction_successful(ctx, hash).await
    }

    async fn get_latest_block_height(&self, ctx: &RpcContext) -> Result<u64> {
        self.inner().get_latest_block_height(ctx).await
    }
}
