//! # chainmeta Registry
//!
//! The set of configured chains, indexed four ways and replaced wholesale
//! on every reload, plus the store-backed token lookups.
//!
//! ## Reload
//!
//! [`ChainRegistry::reload`] reads every chain row, validates it, builds a
//! backend client for each enabled row and only then publishes the new
//! [`ChainSnapshot`] with a single pointer swap. Readers see either the old
//! snapshot or the new one, never a mix. A bad row is skipped and reported;
//! a failed or empty query keeps the previous snapshot.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chainmeta_provider::{DefaultClientFactory, ProviderConfig};
//! use chainmeta_registry::{ChainRegistry, RegistryConfig};
//! use chainmeta_traits::{LogAlertSink, RowStore};
//!
//! # async fn example(store: Arc<dyn RowStore>) -> chainmeta_error::Result<()> {
//! let registry = ChainRegistry::new(
//!     store,
//!     Arc::new(DefaultClientFactory::new(ProviderConfig::default())?),
//!     Arc::new(LogAlertSink),
//!     RegistryConfig::default(),
//! );
//! registry.reload().await?;
//! if let Some(entry) = registry.by_chain_id("1") {
//!     println!("{} via {:?}", entry.name(), entry.client.endpoint());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod registry;
pub mod snapshot;
mod tokens;

pub use config::RegistryConfig;
pub use registry::{ChainRegistry, ReloadReport};
pub use snapshot::{normalize_key, ChainEntry, ChainSnapshot};
pub use tokens::TokenInfoManager;
