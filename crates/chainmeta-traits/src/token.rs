//! Token identity and the resolution flow shared by every chain-RPC variant.

use std::future::Future;

use alloy_primitives::U256;
use chainmeta_cache::{compose_key, RefreshAheadCache};
use chainmeta_error::Result;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chain::ChainConfig;

/// Identity and metadata for one token on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Symbol, e.g. `USDC`
    pub name: String,
    /// Name of the chain the token lives on
    pub chain_name: String,
    /// Backend-native address string
    pub address: String,
    /// Decimal precision
    pub decimals: u8,
    /// Human-readable name
    pub full_name: String,
    /// Total supply in the smallest unit
    #[serde(default)]
    pub total_supply: U256,
    /// Descriptive URL (metadata URI or explorer link)
    #[serde(default)]
    pub url: Option<String>,
}

impl TokenInfo {
    /// Synthetic descriptor for the chain's native asset
    pub fn native(chain: &ChainConfig, address: &str) -> Self {
        Self {
            name: chain.gas_token_name.clone(),
            chain_name: chain.name.clone(),
            address: address.to_string(),
            decimals: chain.gas_token_decimals,
            full_name: chain.alias_name.clone(),
            total_supply: U256::ZERO,
            url: Some(chain.explorer_url.clone()).filter(|u| !u.is_empty()),
        }
    }
}

/// Cache of on-chain token resolutions keyed by `"<chain>#<address>"`
pub type TokenInfoCache = RefreshAheadCache<TokenInfo>;

/// Returns true for `0x0`, `0x000...0` and bare runs of zeros.
pub fn is_zero_hex(address: &str) -> bool {
    let trimmed = address.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    !digits.is_empty() && digits.bytes().all(|b| b == b'0')
}

/// Resolves token info the way every variant does.
///
/// A native-asset address short-circuits to [`TokenInfo::native`] without any
/// network call. Anything else is read through `cache` under
/// `"<chain name>#<cache_address>"`; on a miss `resolve` runs and its result
/// is stored only if it succeeds.
///
/// # Errors
///
/// Propagates the failure from `resolve`.
pub async fn resolve_token_info<F, Fut>(
    chain: &ChainConfig,
    cache: &TokenInfoCache,
    address: &str,
    cache_address: &str,
    is_native: bool,
    resolve: F,
) -> Result<TokenInfo>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<TokenInfo>>,
{
    if is_native {
        trace!(chain = %chain.name, address, "native asset sentinel");
        return Ok(TokenInfo::native(chain, address));
    }

    let key = compose_key(&chain.name, cache_address);
    cache.get_with(&key, resolve).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainRow;
    use chainmeta_cache::{loader_fn, CacheConfig};
    use chainmeta_error::ChainMetaError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn chain() -> ChainConfig {
        ChainConfig::from_row(ChainRow {
            id: 1,
            chain_id: "1".into(),
            name: "ethereum".into(),
            alias_name: "Ethereum".into(),
            backend: 1,
            explorer_url: "https://etherscan.io".into(),
            gas_token_name: "ETH".into(),
            gas_token_decimal: 18,
            ..ChainRow::default()
        })
        .unwrap()
    }

    fn token(address: &str) -> TokenInfo {
        TokenInfo {
            name: "USDC".into(),
            chain_name: "ethereum".into(),
            address: address.into(),
            decimals: 6,
            full_name: "USD Coin".into(),
            total_supply: U256::from(1_000_000u64),
            url: None,
        }
    }

    fn cache() -> TokenInfoCache {
        RefreshAheadCache::new(
            "onchain",
            CacheConfig::default(),
            loader_fn(|key: String| async move {
                Err(ChainMetaError::TokenNotFound {
                    chain: String::new(),
                    address: key,
                })
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_is_zero_hex() {
        assert!(is_zero_hex("0x0000000000000000000000000000000000000000"));
        assert!(is_zero_hex("0x0"));
        assert!(is_zero_hex(" 0X00 "));
        assert!(is_zero_hex("000"));
        assert!(!is_zero_hex("0x"));
        assert!(!is_zero_hex(""));
        assert!(!is_zero_hex("0xdead"));
        assert!(!is_zero_hex("11111111111111111111111111111111"));
    }

    #[test]
    fn test_native_info() {
        let info = TokenInfo::native(&chain(), "0x0");
        assert_eq!(info.name, "ETH");
        assert_eq!(info.decimals, 18);
        assert_eq!(info.full_name, "Ethereum");
        assert_eq!(info.total_supply, U256::ZERO);
        assert_eq!(info.url.as_deref(), Some("https://etherscan.io"));
    }

    #[tokio::test]
    async fn test_native_skips_cache_and_resolver() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let info = resolve_token_info(&chain(), &cache, "0x0", "0x0", true, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(token("0x0"))
        })
        .await
        .unwrap();
        assert_eq!(info.name, "ETH");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_is_cached_after_success() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let info = resolve_token_info(&chain(), &cache, "0xA0b8", "0xa0b8", false, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(token("0xA0b8"))
            })
            .await
            .unwrap();
            assert_eq!(info.decimals, 6);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains_key("ethereum#0xa0b8"));
    }

    #[tokio::test]
    async fn test_failed_resolution_not_cached() {
        let cache = cache();
        let err = resolve_token_info(&chain(), &cache, "0xbad", "0xbad", false, || async {
            Err(ChainMetaError::decode("symbol", "short return"))
        })
        .await
        .unwrap_err();
        assert!(!err.is_retryable());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_token_json_defaults() {
        let info: TokenInfo = serde_json::from_str(
            r#"{"name":"USDT","chain_name":"ethereum","address":"0xdac1","decimals":6,"full_name":"Tether"}"#,
        )
        .unwrap();
        assert_eq!(info.total_supply, U256::ZERO);
        assert!(info.url.is_none());
    }
}
