//! Cache tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Refresh interval used by the token caches unless overridden
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Idle expiry used by the token caches unless overridden
pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(30 * 60);

/// Configuration for a [`crate::RefreshAheadCache`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds between background reloads of a resolved key
    pub refresh_secs: u64,
    /// Seconds a key may go unread before it is dropped; `None` disables expiry
    pub expire_secs: Option<u64>,
    /// Milliseconds between scheduler sweeps
    pub poll_millis: u64,
    /// Upper bound on refreshes running at the same time
    pub max_concurrent_refreshes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            expire_secs: Some(DEFAULT_EXPIRE_AFTER.as_secs()),
            poll_millis: 1_000,
            max_concurrent_refreshes: 16,
        }
    }
}

impl CacheConfig {
    /// Creates the default config (1h refresh, 30m idle expiry)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the refresh interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_secs = interval.as_secs().max(1);
        self
    }

    /// Sets the idle-expiry interval
    pub fn with_expire_after(mut self, expire: Duration) -> Self {
        self.expire_secs = Some(expire.as_secs().max(1));
        self
    }

    /// Disables idle expiry; keys live until the cache is dropped
    pub fn without_expiry(mut self) -> Self {
        self.expire_secs = None;
        self
    }

    /// Sets the scheduler sweep period
    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll_millis = (poll.as_millis() as u64).max(1);
        self
    }

    /// Sets the refresh concurrency bound
    pub fn with_max_concurrent_refreshes(mut self, max: usize) -> Self {
        self.max_concurrent_refreshes = max.max(1);
        self
    }

    /// Refresh interval as a duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    /// Idle-expiry interval as a duration
    pub fn expire_after(&self) -> Option<Duration> {
        self.expire_secs.map(Duration::from_secs)
    }

    /// Scheduler sweep period as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_millis.max(1))
    }
}
