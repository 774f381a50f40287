//! Store-backed token lookups through two refresh-ahead caches.

use std::sync::Arc;

use async_trait::async_trait;
use chainmeta_cache::{compose_key, split_key, CacheConfig, CacheStatsSnapshot, Loader, RefreshAheadCache};
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_traits::{RowStore, TokenInfo};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum Lookup {
    Address,
    Name,
}

struct StoreLoader {
    store: Arc<dyn RowStore>,
    lookup: Lookup,
}

#[async_trait]
impl Loader<TokenInfo> for StoreLoader {
    async fn load(&self, key: &str) -> Result<TokenInfo> {
        let (chain, value) = split_key(key)?;
        let row = match self.lookup {
            Lookup::Address => self.store.query_token_by_address(chain, value).await?,
            Lookup::Name => self.store.query_token_by_name(chain, value).await?,
        };
        row.ok_or_else(|| ChainMetaError::TokenNotFound {
            chain: chain.to_string(),
            address: value.to_string(),
        })
    }
}

/// Token rows from the store, cached by `(chain, address)` and by `(chain, symbol)`
#[derive(Debug, Clone)]
pub struct TokenInfoManager {
    by_address: RefreshAheadCache<TokenInfo>,
    by_name: RefreshAheadCache<TokenInfo>,
}

impl TokenInfoManager {
    /// Creates both caches over `store`.
    ///
    /// # Errors
    ///
    /// [`ChainMetaError::Config`] outside a tokio runtime.
    pub fn new(store: Arc<dyn RowStore>, config: CacheConfig) -> Result<Self> {
        let by_address = RefreshAheadCache::new(
            "token-by-address",
            config.clone(),
            StoreLoader {
                store: Arc::clone(&store),
                lookup: Lookup::Address,
            },
        )?;
        let by_name = RefreshAheadCache::new(
            "token-by-name",
            config,
            StoreLoader {
                store,
                lookup: Lookup::Name,
            },
        )?;
        Ok(Self {
            by_address,
            by_name,
        })
    }

    /// Token row for `address` on `chain`.
    ///
    /// `Ok(None)` when no such row exists or the lookup value cannot form a
    /// valid key.
    ///
    /// # Errors
    ///
    /// Store transport failures.
    pub async fn by_address(&self, chain: &str, address: &str) -> Result<Option<TokenInfo>> {
        found(self.by_address.get(&compose_key(chain, address)).await)
    }

    /// Token row for symbol `name` on `chain`. Same contract as
    /// [`TokenInfoManager::by_address`].
    pub async fn by_name(&self, chain: &str, name: &str) -> Result<Option<TokenInfo>> {
        found(self.by_name.get(&compose_key(chain, name)).await)
    }

    /// Counters of the address-keyed cache
    pub fn address_stats(&self) -> CacheStatsSnapshot {
        self.by_address.stats()
    }

    /// Counters of the name-keyed cache
    pub fn name_stats(&self) -> CacheStatsSnapshot {
        self.by_name.stats()
    }
}

fn found(result: Result<TokenInfo>) -> Result<Option<TokenInfo>> {
    match result {
        Ok(token) => Ok(Some(token)),
        Err(err @ (ChainMetaError::TokenNotFound { .. } | ChainMetaError::InvalidCacheKey(_))) => {
            debug!(error = %err, "token lookup miss");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
