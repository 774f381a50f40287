//! # chainmeta EVM
//!
//! The EVM variant of the chain-RPC contract, built on
//! [alloy](https://github.com/alloy-rs/alloy).
//!
//! - [`EvmClient`]: one read-only JSON-RPC connection per chain
//! - [`EvmRpc`]: [`chainmeta_traits::ChainRpc`] over an [`EvmClient`] and the shared token cache
//!
//! Token metadata is read with a single batched request carrying the four
//! ERC-20 view calls. A contract reporting zero decimals or an empty symbol
//! is treated as "not a token".
//!
//! ```no_run
//! use chainmeta_evm::EvmClient;
//! use chainmeta_resilience::RpcContext;
//! use std::time::Duration;
//!
//! # async fn example() -> chainmeta_error::Result<()> {
//! let client = EvmClient::connect("https://eth.llamarpc.com")?;
//! let ctx = RpcContext::with_timeout(Duration::from_secs(10));
//! let head = client.block_number(&ctx).await?;
//! println!("head: {head}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod erc20;
mod evm_rpc;
mod evmclient;

pub use erc20::{token_info_from_returns, Erc20Returns, ERC20};
pub use evm_rpc::EvmRpc;
pub use evmclient::{parse_address, parse_tx_hash, EvmClient};
