//! Loader seam and the `<chain>#<value>` key shape shared by the token caches.

use std::future::Future;

use async_trait::async_trait;
use chainmeta_error::{ChainMetaError, Result};

/// Separator between the chain name and the lookup value in a cache key
pub const KEY_SEPARATOR: char = '#';

/// Resolves a cache key to a value.
///
/// Implementations return a not-found class error when the key has no
/// value; the cache never stores failures.
#[async_trait]
pub trait Loader<V>: Send + Sync + 'static {
    /// Loads the value for `key`
    async fn load(&self, key: &str) -> Result<V>;
}

/// Adapter turning an async closure into a [`Loader`]
pub struct FnLoader<F>(F);

impl<F> std::fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnLoader")
    }
}

/// Wraps `f` so it can be used as a cache loader
pub fn loader_fn<V, F, Fut>(f: F) -> FnLoader<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V>> + Send + 'static,
{
    FnLoader(f)
}

#[async_trait]
impl<V, F, Fut> Loader<V> for FnLoader<F>
where
    V: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V>> + Send + 'static,
{
    async fn load(&self, key: &str) -> Result<V> {
        (self.0)(key.to_string()).await
    }
}

/// Builds `"<chain>#<value>"`
pub fn compose_key(chain: &str, value: &str) -> String {
    format!("{chain}{KEY_SEPARATOR}{value}")
}

/// Splits a key into `(chain, value)`.
///
/// Exactly one separator is accepted. A chain name or lookup value that
/// itself contains `#` is rejected rather than guessed at.
///
/// # Errors
///
/// Returns [`ChainMetaError::InvalidCacheKey`] for any other shape.
pub fn split_key(key: &str) -> Result<(&str, &str)> {
    let mut parts = key.split(KEY_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(chain), Some(value), None) => Ok((chain, value)),
        _ => Err(ChainMetaError::InvalidCacheKey(key.to_string())),
    }
}
