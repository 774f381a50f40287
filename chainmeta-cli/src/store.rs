//! Row store backed by a JSON file.

use std::path::PathBuf;

use async_trait::async_trait;
use chainmeta::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk shape of the row file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowFile {
    pub chains: Vec<ChainRow>,
    pub tokens: Vec<TokenInfo>,
}

impl RowFile {
    fn find_token(&self, chain: &str, matches: impl Fn(&TokenInfo) -> bool) -> Option<TokenInfo> {
        self.tokens
            .iter()
            .find(|t| t.chain_name.eq_ignore_ascii_case(chain) && matches(t))
            .cloned()
    }
}

/// [`RowStore`] that re-reads its file on every query, so a scheduled
/// reload picks up edits.
#[derive(Debug, Clone)]
pub struct JsonRowStore {
    path: PathBuf,
}

impl JsonRowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<RowFile> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ChainMetaError::Store(format!("{}: {e}", self.path.display())))?;
        let file: RowFile = serde_json::from_str(&raw)
            .map_err(|e| ChainMetaError::Store(format!("{}: {e}", self.path.display())))?;
        debug!(
            path = %self.path.display(),
            chains = file.chains.len(),
            tokens = file.tokens.len(),
            "read row file"
        );
        Ok(file)
    }
}

#[async_trait]
impl RowStore for JsonRowStore {
    async fn query_all_chains(&self) -> Result<Vec<ChainRow>> {
        Ok(self.read().await?.chains)
    }

    async fn query_token_by_address(
        &self,
        chain_name: &str,
        address: &str,
    ) -> Result<Option<TokenInfo>> {
        let file = self.read().await?;
        Ok(file.find_token(chain_name, |t| t.address.eq_ignore_ascii_case(address)))
    }

    async fn query_token_by_name(&self, chain_name: &str, name: &str) -> Result<Option<TokenInfo>> {
        let file = self.read().await?;
        Ok(file.find_token(chain_name, |t| t.name == name))
    }
}
