//! Provider configuration.

use std::str::FromStr;
use std::time::Duration;

use chainmeta_error::{ChainMetaError, Result};
use chainmeta_solana::CommitmentConfig;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default per-call RPC timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the HTTP client behind raw JSON-RPC handles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
    /// Idle connection timeout
    pub pool_idle_timeout_secs: u64,
    /// Connection timeout
    pub connect_timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Enable gzip compression
    pub gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            pool_idle_timeout_secs: 90,
            connect_timeout_secs: 10,
            user_agent: format!("chainmeta/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
        }
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst size (max requests in a burst)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

/// Settings the client factory applies to every handle it builds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Per-call RPC timeout in seconds
    pub request_timeout_secs: u64,
    /// Commitment for Solana account reads (`processed`, `confirmed`, `finalized`)
    pub solana_commitment: String,
    /// HTTP settings for raw JSON-RPC handles
    pub http: HttpClientConfig,
    /// Optional rate limit for raw JSON-RPC handles
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            solana_commitment: "confirmed".to_string(),
            http: HttpClientConfig::default(),
            rate_limit: Some(RateLimitConfig::default()),
        }
    }
}

impl ProviderConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-call timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Sets the Solana commitment level by name
    pub fn with_solana_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.solana_commitment = commitment.into();
        self
    }

    /// Sets or clears the raw JSON-RPC rate limit
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitConfig>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Per-call timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parsed Solana commitment
    pub fn commitment(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(self.solana_commitment.trim()).map_err(|e| {
            ChainMetaError::Config(format!(
                "invalid solana commitment '{}': {e}",
                self.solana_commitment
            ))
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(ChainMetaError::Config(
                "request timeout must be positive".to_string(),
            ));
        }
        if let Some(limit) = self.rate_limit {
            if limit.requests_per_second == 0 || limit.burst_size == 0 {
                return Err(ChainMetaError::Config(
                    "rate limit values must be positive".to_string(),
                ));
            }
        }
        self.commitment().map(|_| ())
    }
}

/// Parses an endpoint URL, accepting only http(s) and ws(s) schemes
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim())
        .map_err(|e| ChainMetaError::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(url),
        other => Err(ChainMetaError::Config(format!(
            "unsupported endpoint scheme '{other}' in '{endpoint}'"
        ))),
    }
}
