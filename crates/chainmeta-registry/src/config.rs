//! Registry configuration.

use std::time::Duration;

use chainmeta_cache::CacheConfig;
use serde::{Deserialize, Serialize};

/// Registry and token-manager settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Seconds between scheduled reloads; `0` disables the schedule
    pub reload_interval_secs: u64,
    /// Budget for one reload, store query included
    pub reload_timeout_secs: u64,
    /// Settings for the store-backed token caches
    pub tokens: CacheConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reload_interval_secs: 300,
            reload_timeout_secs: 60,
            tokens: CacheConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reload interval
    pub fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval_secs = interval.as_secs();
        self
    }

    /// Sets the reload budget
    pub fn with_reload_timeout(mut self, timeout: Duration) -> Self {
        self.reload_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Sets the token cache settings
    pub fn with_token_cache(mut self, tokens: CacheConfig) -> Self {
        self.tokens = tokens;
        self
    }

    /// Reload interval, `None` when scheduled reloads are off
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }

    /// Reload budget
    pub fn reload_timeout(&self) -> Duration {
        Duration::from_secs(self.reload_timeout_secs)
    }
}
