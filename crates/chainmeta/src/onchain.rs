//! Background re-resolution of on-chain token metadata.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainmeta_cache::{split_key, Loader};
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_provider::BackendClient;
use chainmeta_registry::ChainRegistry;
use chainmeta_resilience::RpcContext;
use chainmeta_traits::TokenInfo;
use tracing::trace;

/// Loader behind the on-chain token cache.
///
/// Foreground misses are resolved by the chain-RPC variant itself; this
/// loader serves the scheduler's refreshes, looking the chain up in the
/// registry each time so a reload that replaces a client is picked up.
pub struct OnchainTokenLoader {
    registry: Arc<ChainRegistry>,
    timeout: Duration,
}

impl OnchainTokenLoader {
    /// Resolves against `registry`, giving each refresh `timeout`
    pub fn new(registry: Arc<ChainRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }
}

#[async_trait]
impl Loader<TokenInfo> for OnchainTokenLoader {
    async fn load(&self, key: &str) -> Result<TokenInfo> {
        let (chain, address) = split_key(key)?;
        let entry = self
            .registry
            .by_name(chain)
            .ok_or_else(|| ChainMetaError::ChainNotFound(chain.to_string()))?;
        let ctx = RpcContext::with_timeout(self.timeout);
        trace!(chain, address, "re-resolving token on chain");

        match &entry.client {
            BackendClient::Evm(client) => {
                client.fetch_token_info(&ctx, &entry.config, address).await
            }
            BackendClient::Solana(client) => {
                chainmeta_solana::source::fetch_token_info(client.as_ref(), &ctx, &entry.config, address)
                    .await
            }
            _ => Err(ChainMetaError::unsupported(
                entry.config.backend,
                "token resolution",
            )),
        }
    }
}
