//! # chainmeta Traits
//!
//! Shared data model and contracts for the chainmeta crates.
//!
//! - [`ChainRow`] / [`ChainConfig`]: one configured chain, raw and validated
//! - [`TokenInfo`]: identity of one token on one chain
//! - [`ChainRpc`]: the read-only RPC surface each backend implements
//! - [`RowStore`] / [`AlertSink`]: the persistent store and failure reporting
//!   seams the core consumes
//!
//! ## Example
//!
//! ```rust
//! use chainmeta_traits::{ChainConfig, ChainRow, TokenInfo};
//!
//! let chain = ChainConfig::from_row(ChainRow {
//!     id: 1,
//!     chain_id: "1".into(),
//!     name: "ethereum".into(),
//!     alias_name: "Ethereum".into(),
//!     backend: 1,
//!     gas_token_name: "ETH".into(),
//!     gas_token_decimal: 18,
//!     ..ChainRow::default()
//! })
//! .unwrap();
//!
//! let native = TokenInfo::native(&chain, "0x0000000000000000000000000000000000000000");
//! assert_eq!(native.name, "ETH");
//! assert_eq!(native.decimals, 18);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod rpc;
pub mod store;
pub mod token;

pub use chain::{BackendKind, ChainConfig, ChainRow};
pub use rpc::{ChainRpc, TxStatus};
pub use store::{AlertSink, LogAlertSink, RowStore};
pub use token::{is_zero_hex, resolve_token_info, TokenInfo, TokenInfoCache};

pub use alloy_primitives::U256;
pub use chainmeta_error::{ChainMetaError, ErrorKind, Result};
pub use chainmeta_resilience::RpcContext;
