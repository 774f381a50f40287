//! Configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use chainmeta::ChainMetaConfig;
use serde::{Deserialize, Serialize};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "chainmeta.json";
/// Row file read when neither the config nor the environment names one
pub const DEFAULT_ROWS_PATH: &str = "chainmeta-rows.json";
/// Environment variable overriding the row file
pub const ROWS_ENV: &str = "CHAINMETA_ROWS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON file holding the chain and token tables
    pub rows: PathBuf,
    /// Library configuration
    pub core: ChainMetaConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rows: PathBuf::from(DEFAULT_ROWS_PATH),
            core: ChainMetaConfig::default(),
        }
    }
}

impl CliConfig {
    /// Reads `path`, falling back to defaults when the default file is absent.
    ///
    /// A file named explicitly must exist and parse.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::read(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        if let Ok(rows) = std::env::var(ROWS_ENV) {
            if !rows.trim().is_empty() {
                config.rows = PathBuf::from(rows.trim());
            }
        }
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Parses a config document; missing fields take their defaults
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
