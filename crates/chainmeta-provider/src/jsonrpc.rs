//! Raw JSON-RPC over HTTP for backends without a typed client.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chainmeta_error::{ChainMetaError, Result};
use chainmeta_resilience::RpcContext;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::trace;
use url::Url;

use crate::config::{HttpClientConfig, RateLimitConfig};

/// RPC request payload
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<T: Serialize> {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Method name
    pub method: String,
    /// Parameters
    pub params: T,
    /// Request ID
    pub id: u64,
}

impl<T: Serialize> JsonRpcRequest<T> {
    /// Creates a new JSON-RPC request
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// RPC response payload
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    /// Response ID
    #[serde(default)]
    pub id: u64,
    /// Result (if successful)
    pub result: Option<T>,
    /// Error (if failed)
    pub error: Option<JsonRpcError>,
}

/// RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
}

/// HTTP client with connection pooling and optional rate limiting
pub struct RpcClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client from HTTP and rate-limit settings.
    ///
    /// # Errors
    ///
    /// [`ChainMetaError::Config`] if the HTTP client cannot be built or a
    /// rate-limit value is zero.
    pub fn with_config(
        http_config: &HttpClientConfig,
        request_timeout: Duration,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(http_config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(http_config.pool_idle_timeout_secs))
            .connect_timeout(Duration::from_secs(http_config.connect_timeout_secs))
            .timeout(request_timeout)
            .user_agent(&http_config.user_agent)
            .gzip(http_config.gzip)
            .build()
            .map_err(|e| ChainMetaError::Config(format!("http client: {e}")))?;

        let rate_limiter = match rate_limit {
            Some(config) => {
                let per_second = NonZeroU32::new(config.requests_per_second)
                    .ok_or_else(|| ChainMetaError::Config("requests_per_second is zero".into()))?;
                let burst = NonZeroU32::new(config.burst_size)
                    .ok_or_else(|| ChainMetaError::Config("burst_size is zero".into()))?;
                Some(RateLimiter::direct(
                    Quota::per_second(per_second).allow_burst(burst),
                ))
            }
            None => None,
        };

        Ok(Self {
            client,
            rate_limiter,
            request_id: AtomicU64::new(1),
        })
    }

    /// Makes a JSON-RPC request under `ctx`
    pub async fn rpc_call<P, R>(&self, ctx: &RpcContext, url: &Url, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        ctx.run(method, async {
            if let Some(limiter) = &self.rate_limiter {
                limiter.until_ready().await;
            }

            let id = self.request_id.fetch_add(1, Ordering::SeqCst);
            let request = JsonRpcRequest::new(method, params, id);
            trace!(method, id, "json-rpc request");

            let response = self
                .client
                .post(url.clone())
                .json(&request)
                .send()
                .await
                .map_err(|e| ChainMetaError::rpc(method, e))?;

            let rpc_response: JsonRpcResponse<R> = response
                .json()
                .await
                .map_err(|e| ChainMetaError::decode(method, e))?;

            if let Some(error) = rpc_response.error {
                return Err(ChainMetaError::rpc_rejected(method, error.code, error.message));
            }

            rpc_response
                .result
                .ok_or_else(|| ChainMetaError::decode(method, "no result in response"))
        })
        .await
    }

    /// Returns the number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_id.load(Ordering::SeqCst) - 1
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("request_count", &self.request_count())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish()
    }
}

/// A raw JSON-RPC client bound to one endpoint
#[derive(Debug, Clone)]
pub struct JsonRpcHandle {
    client: Arc<RpcClient>,
    url: Url,
}

impl JsonRpcHandle {
    /// Binds `client` to `url`
    pub fn new(client: Arc<RpcClient>, url: Url) -> Self {
        Self { client, url }
    }

    /// Endpoint this handle talks to
    pub fn endpoint(&self) -> &str {
        self.url.as_str()
    }

    /// Makes a JSON-RPC request against the bound endpoint
    pub async fn call<P, R>(&self, ctx: &RpcContext, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        self.client.rpc_call(ctx, &self.url, method, params).await
    }

    /// Underlying pooled client
    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }
}
