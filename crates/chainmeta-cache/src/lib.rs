//! # chainmeta Cache
//!
//! A keyed refresh-ahead cache. Each cache has three parameters:
//!
//! - a [`Loader`] that resolves a key, or fails with a not-found error;
//! - a refresh interval. After a key is resolved, a background scheduler
//!   reloads it on that period. A failed reload leaves the old value readable.
//! - an optional idle expiry. A key that is not read within that window is
//!   dropped, and the next read loads it again.
//!
//! Concurrent misses for one key share a single loader call. Hits never wait
//! on the loader, even while that key is being refreshed.
//!
//! ```rust
//! use chainmeta_cache::{loader_fn, CacheConfig, RefreshAheadCache};
//!
//! # async fn example() -> chainmeta_error::Result<()> {
//! let cache = RefreshAheadCache::new(
//!     "lengths",
//!     CacheConfig::default(),
//!     loader_fn(|key: String| async move { Ok(key.len()) }),
//! )?;
//! assert_eq!(cache.get("ethereum#0xdead").await?, 15);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod loader;
mod scheduler;
mod stats;

use std::future::Future;
use std::sync::Arc;

use chainmeta_error::{ChainMetaError, Result};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use config::{CacheConfig, DEFAULT_EXPIRE_AFTER, DEFAULT_REFRESH_INTERVAL};
pub use loader::{compose_key, loader_fn, split_key, FnLoader, Loader, KEY_SEPARATOR};
pub use stats::CacheStatsSnapshot;

use stats::CacheStats;

// ============================================================================
// Internal state
// ============================================================================

pub(crate) struct Entry<V> {
    pub(crate) value: V,
    pub(crate) last_read: Instant,
    pub(crate) next_refresh: Instant,
    pub(crate) refreshing: bool,
}

type Flight<V> = Arc<OnceCell<Result<V>>>;

pub(crate) struct Shared<V> {
    pub(crate) name: String,
    pub(crate) config: CacheConfig,
    pub(crate) loader: Arc<dyn Loader<V>>,
    pub(crate) entries: DashMap<String, Entry<V>>,
    inflight: DashMap<String, Flight<V>>,
    pub(crate) stats: CacheStats,
}

impl<V: Clone> Shared<V> {
    fn touch(&self, key: &str) -> Option<V> {
        self.entries.get_mut(key).map(|mut entry| {
            entry.last_read = Instant::now();
            entry.value.clone()
        })
    }

    fn store(&self, key: &str, value: V) {
        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                last_read: now,
                next_refresh: now + self.config.refresh_interval(),
                refreshing: false,
            },
        );
    }
}

struct WorkerGuard {
    cancel: CancellationToken,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Public cache
// ============================================================================

/// Refresh-ahead cache from string keys to `V`.
///
/// Cloning is cheap and shares the same entries. The background scheduler
/// stops when the last clone is dropped.
pub struct RefreshAheadCache<V> {
    shared: Arc<Shared<V>>,
    _worker: Arc<WorkerGuard>,
}

impl<V> Clone for RefreshAheadCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _worker: Arc::clone(&self._worker),
        }
    }
}

impl<V> std::fmt::Debug for RefreshAheadCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshAheadCache")
            .field("name", &self.shared.name)
            .field("entries", &self.shared.entries.len())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl<V> RefreshAheadCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache and spawns its refresh scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ChainMetaError::Config`] when called outside a tokio runtime.
    pub fn new(
        name: impl Into<String>,
        config: CacheConfig,
        loader: impl Loader<V>,
    ) -> Result<Self> {
        Self::with_loader(name, config, Arc::new(loader))
    }

    /// Same as [`RefreshAheadCache::new`] for an already shared loader
    ///
    /// # Errors
    ///
    /// Returns [`ChainMetaError::Config`] when called outside a tokio runtime.
    pub fn with_loader(
        name: impl Into<String>,
        config: CacheConfig,
        loader: Arc<dyn Loader<V>>,
    ) -> Result<Self> {
        let name = name.into();
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            ChainMetaError::Config(format!(
                "cache '{name}' must be created inside a tokio runtime"
            ))
        })?;

        let shared = Arc::new(Shared {
            name,
            config,
            loader,
            entries: DashMap::new(),
            inflight: DashMap::new(),
            stats: CacheStats::default(),
        });

        let cancel = CancellationToken::new();
        handle.spawn(scheduler::run(Arc::clone(&shared), cancel.clone()));

        Ok(Self {
            shared,
            _worker: Arc::new(WorkerGuard { cancel }),
        })
    }

    /// Returns the value for `key`, invoking the configured loader on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the loader's failure. Failures are never stored.
    pub async fn get(&self, key: &str) -> Result<V> {
        let loader = Arc::clone(&self.shared.loader);
        self.get_with(key, || async move { loader.load(key).await })
            .await
    }

    /// Returns the value for `key`, running `init` instead of the configured
    /// loader on a miss.
    ///
    /// Background refreshes of the key still go through the configured loader.
    ///
    /// # Errors
    ///
    /// Propagates the failure from `init`. Failures are never stored.
    pub async fn get_with<F, Fut>(&self, key: &str, init: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.shared.touch(key) {
            self.shared.stats.hit();
            debug!(cache = %self.shared.name, key = %key, "cache hit");
            return Ok(value);
        }
        self.shared.stats.miss();
        debug!(cache = %self.shared.name, key = %key, "cache miss");

        let flight: Flight<V> = self
            .shared
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let shared = &self.shared;
        let result = flight
            .get_or_init(|| async move {
                // a flight that finished just before ours was registered
                if let Some(value) = shared.touch(key) {
                    return Ok(value);
                }
                let loaded = init().await;
                shared.stats.load(loaded.is_ok());
                if let Ok(value) = &loaded {
                    shared.store(key, value.clone());
                }
                loaded
            })
            .await
            .clone();

        self.shared
            .inflight
            .remove_if(key, |_, current| Arc::ptr_eq(current, &flight));
        result
    }

    /// Returns true if `key` currently has a stored value.
    ///
    /// Does not count as a read.
    pub fn contains_key(&self, key: &str) -> bool {
        self.shared.entries.contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Active configuration
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Current counters
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.shared.stats.snapshot()
    }
}
