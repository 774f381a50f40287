//! Immutable point-in-time views of the configured chains.

use std::collections::HashMap;
use std::sync::Arc;

use chainmeta_provider::BackendClient;
use chainmeta_traits::ChainConfig;

/// A configured chain together with its client handle
#[derive(Debug, Clone)]
pub struct ChainEntry {
    /// Validated configuration
    pub config: Arc<ChainConfig>,
    /// Backend client, [`BackendClient::Detached`] for disabled rows
    pub client: BackendClient,
}

impl ChainEntry {
    /// Pairs a config with its client
    pub fn new(config: ChainConfig, client: BackendClient) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }

    /// Chain display name
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Lowercase, whitespace-trimmed form used for string keys
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Every index over one loaded chain set.
///
/// Built once and never mutated; a reload publishes a new snapshot.
#[derive(Debug, Default)]
pub struct ChainSnapshot {
    by_id: HashMap<i64, Arc<ChainEntry>>,
    by_chain_id: HashMap<String, Arc<ChainEntry>>,
    by_name: HashMap<String, Arc<ChainEntry>>,
    by_network_code: HashMap<i32, Arc<ChainEntry>>,
    all: Vec<Arc<ChainEntry>>,
    generation: u64,
}

impl ChainSnapshot {
    /// Indexes `entries` in load order. On a duplicate key the later entry wins.
    pub fn build(entries: Vec<ChainEntry>, generation: u64) -> Self {
        let mut snapshot = Self {
            generation,
            all: Vec::with_capacity(entries.len()),
            ..Self::default()
        };
        for entry in entries {
            let entry = Arc::new(entry);
            let config = &entry.config;
            snapshot.by_id.insert(config.id, Arc::clone(&entry));
            snapshot
                .by_chain_id
                .insert(normalize_key(&config.chain_id), Arc::clone(&entry));
            snapshot
                .by_name
                .insert(normalize_key(&config.name), Arc::clone(&entry));
            snapshot
                .by_network_code
                .insert(config.network_code, Arc::clone(&entry));
            snapshot.all.push(entry);
        }
        snapshot
    }

    /// Reload counter this snapshot was published at; `0` before the first load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Lookup by numeric row id
    pub fn by_id(&self, id: i64) -> Option<Arc<ChainEntry>> {
        self.by_id.get(&id).cloned()
    }

    /// Lookup by external chain id, ignoring case and surrounding whitespace
    pub fn by_chain_id(&self, chain_id: &str) -> Option<Arc<ChainEntry>> {
        self.by_chain_id.get(&normalize_key(chain_id)).cloned()
    }

    /// Lookup by the decimal form of a numeric chain id
    pub fn by_numeric_chain_id(&self, chain_id: i64) -> Option<Arc<ChainEntry>> {
        self.by_chain_id.get(&chain_id.to_string()).cloned()
    }

    /// Lookup by name, ignoring case and surrounding whitespace
    pub fn by_name(&self, name: &str) -> Option<Arc<ChainEntry>> {
        self.by_name.get(&normalize_key(name)).cloned()
    }

    /// Lookup by network code
    pub fn by_network_code(&self, network_code: i32) -> Option<Arc<ChainEntry>> {
        self.by_network_code.get(&network_code).cloned()
    }

    /// Every numeric id, ascending
    pub fn all_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Every loaded entry in load order
    pub fn all_chains(&self) -> &[Arc<ChainEntry>] {
        &self.all
    }

    /// Number of loaded rows
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// True before the first successful load
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
