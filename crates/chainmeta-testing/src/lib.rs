//! # chainmeta Testing Infrastructure
//!
//! Shared test support for the chainmeta crates:
//! - In-memory row store with call counters and injectable failures
//! - An alert sink that records what it was told
//! - A client factory that never touches the network
//! - Row and token fixtures
//! - Property-based strategies for chain rows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chainmeta_testing::*;
//!
//! let store = MemoryRowStore::with_chains(vec![
//!     evm_row(1, "1", "ethereum", 100),
//!     solana_row(2, "101", "solana", 200),
//! ]);
//! store.fail_next_chain_query(ChainMetaError::Store("down".into()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_evm::EvmClient;
use chainmeta_provider::{parse_endpoint, BackendClient, ClientFactory};
use chainmeta_solana::SolanaClient;
use chainmeta_traits::{AlertSink, BackendKind, ChainRow, RowStore, TokenInfo, U256};
use parking_lot::Mutex;
use proptest::prelude::*;

// ============================================================================
// Row Store
// ============================================================================

/// An in-memory [`RowStore`].
///
/// Failures queued with `fail_next_*` are returned, in order, by the next
/// matching queries instead of data.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    chains: Mutex<Vec<ChainRow>>,
    tokens: Mutex<Vec<TokenInfo>>,
    chain_failures: Mutex<VecDeque<ChainMetaError>>,
    token_failures: Mutex<VecDeque<ChainMetaError>>,
    chain_queries: AtomicUsize,
    token_queries: AtomicUsize,
}

impl MemoryRowStore {
    /// A store holding `chains` and no tokens
    pub fn with_chains(chains: Vec<ChainRow>) -> Self {
        let store = Self::default();
        store.set_chains(chains);
        store
    }

    /// Replaces the chain table
    pub fn set_chains(&self, chains: Vec<ChainRow>) {
        *self.chains.lock() = chains;
    }

    /// Appends a token row
    pub fn insert_token(&self, token: TokenInfo) {
        self.tokens.lock().push(token);
    }

    /// Queues a failure for the next `query_all_chains`
    pub fn fail_next_chain_query(&self, error: ChainMetaError) {
        self.chain_failures.lock().push_back(error);
    }

    /// Queues a failure for the next token query of either kind
    pub fn fail_next_token_query(&self, error: ChainMetaError) {
        self.token_failures.lock().push_back(error);
    }

    /// Number of `query_all_chains` calls so far
    pub fn chain_queries(&self) -> usize {
        self.chain_queries.load(Ordering::SeqCst)
    }

    /// Number of token queries so far
    pub fn token_queries(&self) -> usize {
        self.token_queries.load(Ordering::SeqCst)
    }

    fn find_token(&self, chain: &str, matches: impl Fn(&TokenInfo) -> bool) -> Result<Option<TokenInfo>> {
        self.token_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.token_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self
            .tokens
            .lock()
            .iter()
            .find(|t| t.chain_name == chain && matches(t))
            .cloned())
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn query_all_chains(&self) -> Result<Vec<ChainRow>> {
        self.chain_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.chain_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.chains.lock().clone())
    }

    async fn query_token_by_address(&self, chain_name: &str, address: &str) -> Result<Option<TokenInfo>> {
        self.find_token(chain_name, |t| t.address == address)
    }

    async fn query_token_by_name(&self, chain_name: &str, name: &str) -> Result<Option<TokenInfo>> {
        self.find_token(chain_name, |t| t.name == name)
    }
}

// ============================================================================
// Alert Sink
// ============================================================================

/// An [`AlertSink`] that keeps every report
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    reports: Mutex<Vec<(String, ChainMetaError)>>,
}

impl RecordingAlertSink {
    /// Contexts of every report, oldest first
    pub fn contexts(&self) -> Vec<String> {
        self.reports.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Every report, oldest first
    pub fn reports(&self) -> Vec<(String, ChainMetaError)> {
        self.reports.lock().clone()
    }

    /// Number of reports
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// True if nothing was reported
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl AlertSink for RecordingAlertSink {
    fn report_failure(&self, context: &str, error: &ChainMetaError) {
        self.reports.lock().push((context.to_string(), error.clone()));
    }
}

// ============================================================================
// Client Factory
// ============================================================================

/// A [`ClientFactory`] that builds real but unconnected clients.
///
/// EVM and Solana clients make no request until used. Starknet and the
/// registry-only backends come back detached. Endpoints registered with
/// [`StubClientFactory::fail_endpoint`] fail to build.
#[derive(Debug, Default)]
pub struct StubClientFactory {
    failing: Mutex<HashSet<String>>,
    builds: AtomicUsize,
}

impl StubClientFactory {
    /// Makes every build for `endpoint` fail
    pub fn fail_endpoint(&self, endpoint: impl Into<String>) {
        self.failing.lock().insert(endpoint.into());
    }

    /// Number of `build_client` calls so far
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for StubClientFactory {
    async fn build_client(&self, backend: BackendKind, endpoint: &str) -> Result<BackendClient> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(endpoint) {
            return Err(ChainMetaError::Config(format!("refusing to build {endpoint}")));
        }
        match backend {
            BackendKind::Evm => {
                let url = parse_endpoint(endpoint)?;
                Ok(BackendClient::Evm(Arc::new(EvmClient::connect(url.as_str())?)))
            }
            BackendKind::Solana => {
                let url = parse_endpoint(endpoint)?;
                Ok(BackendClient::Solana(Arc::new(SolanaClient::new(url.as_str()))))
            }
            _ => Ok(BackendClient::Detached),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// An enabled EVM chain row with an 18-decimal native asset
pub fn evm_row(id: i64, chain_id: &str, name: &str, network_code: i32) -> ChainRow {
    ChainRow {
        id,
        chain_id: chain_id.to_string(),
        real_chain_id: chain_id.to_string(),
        name: name.to_string(),
        alias_name: format!("{name} mainnet"),
        backend: BackendKind::Evm.code(),
        eip1559: true,
        network_code,
        block_interval: 12_000,
        rpc_endpoint: format!("http://127.0.0.1:8545/{name}"),
        explorer_url: format!("https://explorer.example.org/{name}"),
        gas_token_name: "ETH".to_string(),
        gas_token_decimal: 18,
        ..ChainRow::default()
    }
}

/// An enabled Solana chain row with SOL as native asset
pub fn solana_row(id: i64, chain_id: &str, name: &str, network_code: i32) -> ChainRow {
    ChainRow {
        id,
        chain_id: chain_id.to_string(),
        real_chain_id: chain_id.to_string(),
        name: name.to_string(),
        alias_name: "Solana".to_string(),
        backend: BackendKind::Solana.code(),
        network_code,
        block_interval: 400,
        rpc_endpoint: "http://127.0.0.1:8899".to_string(),
        explorer_url: "https://solscan.io".to_string(),
        gas_token_name: "SOL".to_string(),
        gas_token_decimal: 9,
        ..ChainRow::default()
    }
}

/// A token row
pub fn token(chain: &str, symbol: &str, address: &str, decimals: u8) -> TokenInfo {
    TokenInfo {
        name: symbol.to_string(),
        chain_name: chain.to_string(),
        address: address.to_string(),
        decimals,
        full_name: format!("{symbol} token"),
        total_supply: U256::from(1_000_000_000u64),
        url: None,
    }
}

// ============================================================================
// Edge Case Addresses
// ============================================================================

/// Addresses every chain-RPC variant must reject as decode failures
pub struct EdgeCaseAddresses;

impl EdgeCaseAddresses {
    /// Malformed EVM addresses
    pub fn invalid_evm() -> Vec<&'static str> {
        vec![
            "",
            "0x",
            "0x123",
            "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
            "742d35Cc6634C0532925a3b844Bc9e7595f0bEb",
            "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb00",
        ]
    }

    /// Malformed Solana addresses
    pub fn invalid_solana() -> Vec<&'static str> {
        vec![
            "",
            "0OIl",
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1vEPjFWdd5",
            "not base58!",
        ]
    }
}

// ============================================================================
// Property Strategies
// ============================================================================

/// Backend codes as stored, including unknown ones
pub fn backend_code() -> impl Strategy<Value = i32> {
    prop_oneof![1..=7i32, any::<i32>()]
}

/// Padded, mixed-case chain names
pub fn padded_name() -> impl Strategy<Value = String> {
    ("[ \t]{0,2}", "[a-zA-Z][a-zA-Z0-9-]{0,15}", "[ \t]{0,2}")
        .prop_map(|(pre, name, post)| format!("{pre}{name}{post}"))
}

/// Chain rows with valid required columns and arbitrary optional ones
pub fn chain_row() -> impl Strategy<Value = ChainRow> {
    (
        any::<i64>(),
        1u32..100_000,
        padded_name(),
        backend_code(),
        any::<i32>(),
        0i32..=36,
        any::<bool>(),
        proptest::option::of("[ ]{0,2}[0-9a-fx]{0,42}[ ]{0,2}"),
    )
        .prop_map(
            |(id, chain_id, name, backend, network_code, decimals, disabled, transfer)| ChainRow {
                id,
                chain_id: format!(" {chain_id}"),
                name,
                backend,
                network_code,
                disabled,
                gas_token_decimal: decimals,
                transfer_contract_address: transfer,
                ..ChainRow::default()
            },
        )
}
