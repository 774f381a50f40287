//! Collaborator contracts: the row store gateway and the alert sink.

use async_trait::async_trait;
use chainmeta_error::{ChainMetaError, Result};
use tracing::error;

use crate::chain::ChainRow;
use crate::token::TokenInfo;

/// Query access to the persistent chain and token tables
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Every chain row, enabled or not
    async fn query_all_chains(&self) -> Result<Vec<ChainRow>>;

    /// One token row by `(chain name, address)`
    async fn query_token_by_address(
        &self,
        chain_name: &str,
        address: &str,
    ) -> Result<Option<TokenInfo>>;

    /// One token row by `(chain name, symbol)`
    async fn query_token_by_name(&self, chain_name: &str, name: &str) -> Result<Option<TokenInfo>>;
}

/// Receives failures worth a human's attention.
///
/// Purely observational; implementations must not fail or block.
pub trait AlertSink: Send + Sync {
    /// Reports `error` raised while doing `context`
    fn report_failure(&self, context: &str, error: &ChainMetaError);
}

/// Alert sink that writes to the tracing pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn report_failure(&self, context: &str, error: &ChainMetaError) {
        error!(context, kind = %error.kind(), error = %error, "failure reported");
    }
}
