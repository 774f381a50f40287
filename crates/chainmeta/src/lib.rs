//! # chainmeta - Multi-Chain Metadata Core
//!
//! chainmeta keeps a consistent, queryable snapshot of configured chains
//! and resolves token metadata and balances across EVM and Solana backends.
//!
//! | Piece | Crate |
//! |-------|-------|
//! | Errors | [`error`] |
//! | Contexts and deadlines | [`resilience`] |
//! | Refresh-ahead cache | [`cache`] |
//! | Data model and contracts | [`traits`] |
//! | Client factory | [`provider`] |
//! | Chain registry and token lookups | [`registry`] |
//! | EVM variant | [`evm`] |
//! | Solana variant | [`solana`] |
//!
//! ## Example
//!
//! ```ignore
//! use chainmeta::prelude::*;
//!
//! let meta = ChainMeta::builder(store).build()?;
//! meta.start().await?;
//!
//! let rpc = meta.rpc("ethereum")?;
//! let ctx = meta.context();
//! let usdc = rpc.get_token_info(&ctx, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").await?;
//! let head = rpc.get_latest_block_height(&ctx).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// ============================================================================
// Re-exports
// ============================================================================

pub use chainmeta_cache as cache;
pub use chainmeta_error as error;
pub use chainmeta_evm as evm;
pub use chainmeta_provider as provider;
pub use chainmeta_registry as registry;
pub use chainmeta_resilience as resilience;
pub use chainmeta_solana as solana;
pub use chainmeta_traits as traits;

// ============================================================================
// Service
// ============================================================================

pub mod config;
mod dispatch;
mod onchain;
mod service;

pub use config::ChainMetaConfig;
pub use dispatch::ChainRpcClient;
pub use onchain::OnchainTokenLoader;
pub use service::{ChainMeta, ChainMetaBuilder};

/// The types most callers need
pub mod prelude {
    pub use crate::{ChainMeta, ChainMetaConfig, ChainRpcClient};
    pub use chainmeta_error::{ChainMetaError, ErrorKind, Result};
    pub use chainmeta_registry::{ChainEntry, ChainRegistry, ReloadReport};
    pub use chainmeta_resilience::RpcContext;
    pub use chainmeta_traits::{
        AlertSink, BackendKind, ChainConfig, ChainRow, ChainRpc, RowStore, TokenInfo, TxStatus,
        U256,
    };
}
