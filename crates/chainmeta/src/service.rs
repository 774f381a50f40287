//! The wired-up metadata service.

use std::sync::Arc;

use chainmeta_cache::RefreshAheadCache;
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_provider::{ClientFactory, DefaultClientFactory};
use chainmeta_registry::{ChainEntry, ChainRegistry, ReloadReport, TokenInfoManager};
use chainmeta_resilience::{CancellationToken, RpcContext};
use chainmeta_traits::{AlertSink, LogAlertSink, RowStore, TokenInfoCache};
use tracing::info;

use crate::config::ChainMetaConfig;
use crate::dispatch::ChainRpcClient;
use crate::onchain::OnchainTokenLoader;

// Cancels the scheduled reload when the last service handle goes away.
#[derive(Debug, Default)]
struct ReloadTask {
    cancel: CancellationToken,
}

impl Drop for ReloadTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Builder for [`ChainMeta`]
pub struct ChainMetaBuilder {
    store: Arc<dyn RowStore>,
    factory: Option<Arc<dyn ClientFactory>>,
    alerts: Arc<dyn AlertSink>,
    config: ChainMetaConfig,
}

impl ChainMetaBuilder {
    /// Starts a builder over `store`
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            factory: None,
            alerts: Arc::new(LogAlertSink),
            config: ChainMetaConfig::default(),
        }
    }

    /// Uses `factory` instead of the default client factory
    pub fn client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Sends failure reports to `alerts` instead of the log
    pub fn alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    /// Replaces the configuration
    pub fn config(mut self, config: ChainMetaConfig) -> Self {
        self.config = config;
        self
    }

    /// Wires the registry and caches. Nothing is loaded yet; see
    /// [`ChainMeta::start`].
    ///
    /// # Errors
    ///
    /// [`ChainMetaError::Config`] for an invalid provider configuration or
    /// when called outside a tokio runtime.
    pub fn build(self) -> Result<ChainMeta> {
        let factory = match self.factory {
            Some(factory) => factory,
            None => Arc::new(DefaultClientFactory::new(self.config.provider.clone())?),
        };
        let registry = Arc::new(ChainRegistry::new(
            Arc::clone(&self.store),
            factory,
            self.alerts,
            self.config.registry.clone(),
        ));
        let tokens = TokenInfoManager::new(self.store, self.config.registry.tokens.clone())?;
        let onchain = RefreshAheadCache::new(
            "onchain-tokens",
            self.config.onchain_tokens.clone(),
            OnchainTokenLoader::new(Arc::clone(&registry), self.config.provider.request_timeout()),
        )?;

        Ok(ChainMeta {
            registry,
            tokens,
            onchain,
            config: self.config,
            reload: Arc::new(ReloadTask::default()),
        })
    }
}

/// Chain registry, token lookups and chain-RPC dispatch behind one handle.
///
/// Cheap to clone; clones share every cache and the registry. The scheduled
/// reload stops when the last clone is dropped or on [`ChainMeta::shutdown`].
#[derive(Clone)]
pub struct ChainMeta {
    registry: Arc<ChainRegistry>,
    tokens: TokenInfoManager,
    onchain: TokenInfoCache,
    config: ChainMetaConfig,
    reload: Arc<ReloadTask>,
}

impl std::fmt::Debug for ChainMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainMeta")
            .field("registry", &self.registry)
            .field("onchain_tokens", &self.onchain.len())
            .finish()
    }
}

impl ChainMeta {
    /// Starts a builder over `store`
    pub fn builder(store: Arc<dyn RowStore>) -> ChainMetaBuilder {
        ChainMetaBuilder::new(store)
    }

    /// Loads the chain set and, if configured, schedules periodic reloads.
    ///
    /// # Errors
    ///
    /// The initial reload's failure. No reload task is started in that case.
    pub async fn start(&self) -> Result<ReloadReport> {
        let report = self.registry.reload().await?;
        if let Some(interval) = self.config.registry.reload_interval() {
            self.registry
                .spawn_reload_task(interval, self.reload.cancel.clone());
            info!(interval_secs = interval.as_secs(), "scheduled chain reloads");
        }
        Ok(report)
    }

    /// Stops the scheduled reload
    pub fn shutdown(&self) {
        self.reload.cancel.cancel();
    }

    /// Token that stops the scheduled reload when cancelled
    pub fn reload_token(&self) -> CancellationToken {
        self.reload.cancel.clone()
    }

    /// The chain registry
    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    /// Store-backed token lookups
    pub fn tokens(&self) -> &TokenInfoManager {
        &self.tokens
    }

    /// The on-chain token cache shared by every chain-RPC client
    pub fn onchain_tokens(&self) -> &TokenInfoCache {
        &self.onchain
    }

    /// Active configuration
    pub fn config(&self) -> &ChainMetaConfig {
        &self.config
    }

    /// A fresh context carrying the configured per-call timeout
    pub fn context(&self) -> RpcContext {
        RpcContext::with_timeout(self.config.provider.request_timeout())
    }

    /// Chain-RPC client for the chain named `chain`.
    ///
    /// # Errors
    ///
    /// [`ChainMetaError::ChainNotFound`] for an unknown name and
    /// [`ChainMetaError::Unsupported`] for chains without a chain-RPC variant.
    pub fn rpc(&self, chain: &str) -> Result<ChainRpcClient> {
        let entry = self
            .registry
            .by_name(chain)
            .ok_or_else(|| ChainMetaError::ChainNotFound(chain.to_string()))?;
        self.rpc_for(&entry)
    }

    /// Chain-RPC client for the chain with external id `chain_id`
    pub fn rpc_by_chain_id(&self, chain_id: &str) -> Result<ChainRpcClient> {
        let entry = self
            .registry
            .by_chain_id(chain_id)
            .ok_or_else(|| ChainMetaError::ChainNotFound(chain_id.to_string()))?;
        self.rpc_for(&entry)
    }

    /// Chain-RPC client for an entry already looked up
    pub fn rpc_for(&self, entry: &ChainEntry) -> Result<ChainRpcClient> {
        ChainRpcClient::for_entry(entry, self.onchain.clone())
    }
}
