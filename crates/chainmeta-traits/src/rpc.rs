//! The chain-RPC capability contract.

use alloy_primitives::U256;
use async_trait::async_trait;
use chainmeta_error::Result;
use chainmeta_resilience::RpcContext;
use serde::{Deserialize, Serialize};

use crate::chain::{BackendKind, ChainConfig};
use crate::token::TokenInfo;

/// Finality of a transaction as seen by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatus {
    /// Executed without error
    pub success: bool,
    /// Block number (EVM) or slot (Solana) the transaction landed in
    pub block_height: Option<u64>,
}

impl TxStatus {
    /// Status reported for a hash the backend does not know about
    pub fn not_found() -> Self {
        Self {
            success: false,
            block_height: None,
        }
    }
}

/// Read-only RPC surface every supported backend implements.
///
/// Implementations are stateless apart from their client handle and token
/// cache; every call is independent. All methods run under the caller's
/// [`RpcContext`] and never panic on malformed input: unparsable addresses
/// and hashes come back as decode-class errors.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Backend this implementation speaks
    fn backend(&self) -> BackendKind;

    /// Chain configuration the implementation was built from
    fn chain(&self) -> &ChainConfig;

    /// Resolves token identity, consulting the token cache first
    async fn get_token_info(&self, ctx: &RpcContext, address: &str) -> Result<TokenInfo>;

    /// Balance of `owner` in `token` (native asset for the sentinel address)
    async fn get_balance(&self, ctx: &RpcContext, owner: &str, token: &str) -> Result<U256>;

    /// Balance pinned to a historical block
    async fn get_balance_at(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        block: u64,
    ) -> Result<U256>;

    /// Amount `spender` may move out of `owner`'s `token` balance
    async fn get_allowance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        spender: &str,
    ) -> Result<U256>;

    /// Whether the transaction executed successfully, and where
    async fn is_transaction_successful(&self, ctx: &RpcContext, hash: &str) -> Result<TxStatus>;

    /// Current head height (block number or finalized slot)
    async fn get_latest_block_height(&self, ctx: &RpcContext) -> Result<u64>;
}
