//! The chain registry and its reload cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chainmeta_error::{ChainMetaError, Result};
use chainmeta_provider::{BackendClient, ClientFactory};
use chainmeta_resilience::{with_timeout, CancellationToken};
use chainmeta_traits::{AlertSink, ChainConfig, ChainRow, RowStore};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::RegistryConfig;
use crate::snapshot::{ChainEntry, ChainSnapshot};

/// Outcome of a successful reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadReport {
    /// Rows published in the new snapshot
    pub loaded: usize,
    /// Rows left out because they failed validation or client construction
    pub skipped: usize,
    /// Generation of the published snapshot
    pub generation: u64,
}

/// Owns the configured chains and the indices over them.
///
/// Reads go through a shared lock that is only ever held for an `Arc`
/// clone or a pointer swap, so a reload never stalls a reader behind row
/// fetching or client construction.
pub struct ChainRegistry {
    snapshot: RwLock<Arc<ChainSnapshot>>,
    store: Arc<dyn RowStore>,
    factory: Arc<dyn ClientFactory>,
    alerts: Arc<dyn AlertSink>,
    config: RegistryConfig,
    generation: AtomicU64,
    reload_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ChainRegistry")
            .field("chains", &snapshot.len())
            .field("generation", &snapshot.generation())
            .finish()
    }
}

impl ChainRegistry {
    /// Creates an empty registry. Nothing is loaded until [`ChainRegistry::reload`].
    pub fn new(
        store: Arc<dyn RowStore>,
        factory: Arc<dyn ClientFactory>,
        alerts: Arc<dyn AlertSink>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(ChainSnapshot::default())),
            store,
            factory,
            alerts,
            config,
            generation: AtomicU64::new(0),
            reload_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Registry settings
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The current snapshot. Holding it pins a consistent view across
    /// several lookups even if a reload publishes in between.
    pub fn snapshot(&self) -> Arc<ChainSnapshot> {
        self.snapshot.read().clone()
    }

    /// Re-reads every chain row and publishes a new snapshot.
    ///
    /// Rows that fail validation or client construction are reported to the
    /// alert sink and left out. Reloads are serialized.
    ///
    /// # Errors
    ///
    /// A store failure, a timeout, or an empty row set aborts the reload;
    /// the previous snapshot stays published and the failure is reported.
    pub async fn reload(&self) -> Result<ReloadReport> {
        let _serial = self.reload_lock.lock().await;

        let rows = match self.fetch_rows().await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "chain reload aborted, keeping previous snapshot");
                self.alerts.report_failure("reload chains", &err);
                return Err(err);
            }
        };

        let total = rows.len();
        let mut entries = Vec::with_capacity(total);
        for row in rows {
            let id = row.id;
            match self.build_entry(row).await {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(id, error = %err, "skipping chain row");
                    self.alerts.report_failure("load chain row", &err);
                }
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(ChainSnapshot::build(entries, generation));
        let loaded = snapshot.len();
        *self.snapshot.write() = snapshot;

        let report = ReloadReport {
            loaded,
            skipped: total - loaded,
            generation,
        };
        info!(
            chains = report.loaded,
            skipped = report.skipped,
            generation,
            "loaded chain snapshot"
        );
        Ok(report)
    }

    async fn fetch_rows(&self) -> Result<Vec<ChainRow>> {
        let rows = with_timeout(
            self.config.reload_timeout(),
            "query_all_chains",
            self.store.query_all_chains(),
        )
        .await?;
        if rows.is_empty() {
            return Err(ChainMetaError::EmptyChainSet);
        }
        Ok(rows)
    }

    async fn build_entry(&self, row: ChainRow) -> Result<ChainEntry> {
        let config = ChainConfig::from_row(row)?;
        let client = if config.is_enabled() {
            self.factory
                .build_client(config.backend, &config.rpc_endpoint)
                .await
                .map_err(|err| ChainMetaError::InvalidChainRow {
                    id: config.id,
                    reason: format!("{} client: {err}", config.backend),
                })?
        } else {
            debug!(chain = %config.name, "disabled chain, no client");
            BackendClient::Detached
        };
        Ok(ChainEntry::new(config, client))
    }

    /// Reloads every `interval` until `cancel` fires.
    ///
    /// The first tick is one interval from now; callers load on start
    /// themselves. Failures are already reported by [`ChainRegistry::reload`].
    pub fn spawn_reload_task(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("chain reload task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let _ = registry.reload().await;
                    }
                }
            }
        })
    }

    // ============ Lookups ============

    /// Lookup by numeric row id
    pub fn by_id(&self, id: i64) -> Option<Arc<ChainEntry>> {
        self.snapshot.read().by_id(id)
    }

    /// Lookup by external chain id, ignoring case and surrounding whitespace
    pub fn by_chain_id(&self, chain_id: &str) -> Option<Arc<ChainEntry>> {
        self.snapshot.read().by_chain_id(chain_id)
    }

    /// Lookup by the decimal form of a numeric chain id
    pub fn by_numeric_chain_id(&self, chain_id: i64) -> Option<Arc<ChainEntry>> {
        self.snapshot.read().by_numeric_chain_id(chain_id)
    }

    /// Lookup by name, ignoring case and surrounding whitespace
    pub fn by_name(&self, name: &str) -> Option<Arc<ChainEntry>> {
        self.snapshot.read().by_name(name)
    }

    /// Lookup by network code
    pub fn by_network_code(&self, network_code: i32) -> Option<Arc<ChainEntry>> {
        self.snapshot.read().by_network_code(network_code)
    }

    /// Every numeric id, ascending
    pub fn all_ids(&self) -> Vec<i64> {
        self.snapshot.read().all_ids()
    }

    /// Every loaded entry in load order
    pub fn all_chains(&self) -> Vec<Arc<ChainEntry>> {
        self.snapshot.read().all_chains().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainmeta_testing::{evm_row, solana_row, MemoryRowStore, RecordingAlertSink, StubClientFactory};

    fn registry(store: Arc<MemoryRowStore>, alerts: Arc<RecordingAlertSink>) -> ChainRegistry {
        ChainRegistry::new(
            store,
            Arc::new(StubClientFactory::default()),
            alerts,
            RegistryConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_reload_publishes_snapshot() {
        let store = Arc::new(MemoryRowStore::with_chains(vec![
            evm_row(1, "1", "ethereum", 100),
            solana_row(2, "101", "solana", 200),
        ]));
        let alerts = Arc::new(RecordingAlertSink::default());
        let registry = registry(Arc::clone(&store), Arc::clone(&alerts));

        assert!(registry.snapshot().is_empty());
        let report = registry.reload().await.unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.generation, 1);

        assert!(registry.by_name("ethereum").unwrap().client.as_evm().is_some());
        assert!(registry.by_name("Solana").unwrap().client.as_solana().is_some());
        assert_eq!(registry.all_ids(), vec![1, 2]);
        assert!(alerts.is_empty());
        assert_eq!(store.chain_queries(), 1);
    }

    #[tokio::test]
    async fn test_bad_rows_are_skipped_and_reported() {
        let mut broken = evm_row(3, "", "nameless", 300);
        broken.name = " ".into();
        let mut bad_endpoint = evm_row(4, "10", "optimism", 400);
        bad_endpoint.rpc_endpoint = "not a url".into();
        let store = Arc::new(MemoryRowStore::with_chains(vec![
            evm_row(1, "1", "ethereum", 100),
            broken,
            bad_endpoint,
        ]));
        let alerts = Arc::new(RecordingAlertSink::default());
        let registry = registry(store, Arc::clone(&alerts));

        let report = registry.reload().await.unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(alerts.len(), 2);
        assert!(registry.by_name("optimism").is_none());
        assert!(registry.by_network_code(300).is_none());
    }

    #[tokio::test]
    async fn test_disabled_row_is_detached() {
        let mut row = evm_row(5, "56", "bsc", 500);
        row.disabled = true;
        row.rpc_endpoint = String::new();
        let store = Arc::new(MemoryRowStore::with_chains(vec![row]));
        let registry = registry(store, Arc::new(RecordingAlertSink::default()));

        registry.reload().await.unwrap();
        let entry = registry.by_id(5).unwrap();
        assert!(entry.client.is_detached());
        assert!(!entry.config.is_enabled());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let store = Arc::new(MemoryRowStore::with_chains(vec![evm_row(1, "1", "ethereum", 100)]));
        let alerts = Arc::new(RecordingAlertSink::default());
        let registry = registry(Arc::clone(&store), Arc::clone(&alerts));
        registry.reload().await.unwrap();

        store.fail_next_chain_query(ChainMetaError::Store("connection reset".into()));
        let err = registry.reload().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(registry.snapshot().generation(), 1);
        assert!(registry.by_name("ethereum").is_some());

        store.set_chains(Vec::new());
        let err = registry.reload().await.unwrap_err();
        assert!(matches!(err, ChainMetaError::EmptyChainSet));
        assert!(registry.by_name("ethereum").is_some());
        assert_eq!(alerts.contexts(), vec!["reload chains", "reload chains"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_task_runs_until_cancelled() {
        let store = Arc::new(MemoryRowStore::with_chains(vec![evm_row(1, "1", "ethereum", 100)]));
        let registry = Arc::new(registry(Arc::clone(&store), Arc::new(RecordingAlertSink::default())));
        let cancel = CancellationToken::new();
        let task = registry.spawn_reload_task(Duration::from_secs(60), cancel.clone());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.chain_queries(), 0);
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(store.chain_queries(), 2);
        assert_eq!(registry.snapshot().generation(), 2);

        cancel.cancel();
        task.await.unwrap();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(store.chain_queries(), 2);
    }
}
