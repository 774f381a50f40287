//! # chainmeta Resilience
//!
//! Execution-context plumbing for chain-RPC and store round trips:
//!
//! - **RpcContext**: a cancellable context with an optional deadline, passed
//!   to every chain-RPC operation
//! - **Timeouts**: per-operation budgets and a [`Deadline`] spanning several
//!   round trips
//!
//! Retrying is left to callers; [`chainmeta_error::ChainMetaError::is_retryable`]
//! tells them when it is worth it.
//!
//! ```rust
//! use chainmeta_resilience::RpcContext;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let ctx = RpcContext::with_timeout(Duration::from_secs(10));
//! let height = ctx.run("eth_blockNumber", async { Ok(19_000_000u64) }).await;
//! assert_eq!(height.unwrap(), 19_000_000);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod timeout;

pub use context::RpcContext;
pub use timeout::{with_timeout, Deadline};

/// Re-exported so callers can build contexts from their own shutdown tokens
pub use tokio_util::sync::CancellationToken;
