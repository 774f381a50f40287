//! Top-level configuration for a [`crate::ChainMeta`] instance.

use chainmeta_cache::CacheConfig;
use chainmeta_provider::ProviderConfig;
use chainmeta_registry::RegistryConfig;
use serde::{Deserialize, Serialize};

/// Everything a [`crate::ChainMeta`] needs besides its collaborators
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainMetaConfig {
    /// Reload schedule and store-backed token caches
    pub registry: RegistryConfig,
    /// Client construction and per-call timeout
    pub provider: ProviderConfig,
    /// On-chain token resolution cache
    pub onchain_tokens: CacheConfig,
}

impl ChainMetaConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the registry settings
    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the provider settings
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    /// Replaces the on-chain token cache settings
    pub fn with_onchain_tokens(mut self, onchain_tokens: CacheConfig) -> Self {
        self.onchain_tokens = onchain_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config: ChainMetaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.registry, RegistryConfig::default());
        assert_eq!(config.onchain_tokens, CacheConfig::default());
        assert_eq!(config.provider.request_timeout_secs, 30);
    }

    #[test]
    fn test_nested_overrides() {
        let config: ChainMetaConfig = serde_json::from_str(
            r#"{
                "registry": {"reload_interval_secs": 0},
                "provider": {"solana_commitment": "finalized"},
                "onchain_tokens": {"expire_secs": null}
            }"#,
        )
        .unwrap();
        assert!(config.registry.reload_interval().is_none());
        assert_eq!(config.provider.solana_commitment, "finalized");
        assert!(config.onchain_tokens.expire_after().is_none());
    }
}
