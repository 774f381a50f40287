//! # chainmeta Provider
//!
//! Backend client construction for the chain registry.
//!
//! A [`ClientFactory`] turns a backend kind and an endpoint URL into a
//! [`BackendClient`], a sum type with one variant per backend that has a
//! client. The registry stores the result next to each chain config and
//! never looks inside it; only the chain-RPC variant for that backend does.
//!
//! - EVM rows get an alloy provider
//! - Solana rows get a nonblocking Solana RPC client at the configured commitment
//! - Starknet rows get a raw JSON-RPC handle sharing one pooled, rate-limited HTTP client
//! - everything else is registered with a detached handle
//!
//! ## Example
//!
//! ```no_run
//! use chainmeta_provider::{ClientFactory, DefaultClientFactory, ProviderConfig};
//! use chainmeta_traits::BackendKind;
//!
//! # async fn example() -> chainmeta_error::Result<()> {
//! let factory = DefaultClientFactory::new(ProviderConfig::default().with_timeout(10))?;
//! let client = factory
//!     .build_client(BackendKind::Evm, "https://eth.llamarpc.com")
//!     .await?;
//! assert!(client.as_evm().is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
pub mod config;
pub mod jsonrpc;

pub use client::{BackendClient, ClientFactory, DefaultClientFactory};
pub use config::{parse_endpoint, HttpClientConfig, ProviderConfig, RateLimitConfig};
pub use jsonrpc::{JsonRpcHandle, RpcClient};
