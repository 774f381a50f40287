//! Output shapes printed by the commands.

use chainmeta::prelude::*;
use chainmeta::registry::ChainEntry;
use serde::Serialize;

/// One line of `chains`
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    pub id: i64,
    pub chain_id: String,
    pub name: String,
    pub backend: String,
    pub network_code: i32,
    pub enabled: bool,
    pub connected: bool,
}

impl From<&ChainEntry> for ChainSummary {
    fn from(entry: &ChainEntry) -> Self {
        let config = &entry.config;
        Self {
            id: config.id,
            chain_id: config.chain_id.clone(),
            name: config.name.clone(),
            backend: config.backend.to_string(),
            network_code: config.network_code,
            enabled: config.is_enabled(),
            connected: !entry.client.is_detached(),
        }
    }
}

/// Result of `balance` and `allowance`
#[derive(Debug, Clone, Serialize)]
pub struct Amount {
    pub chain: String,
    pub token: String,
    pub raw: String,
    pub decimals: u8,
    pub formatted: String,
}

impl Amount {
    pub fn new(chain: &str, token: &TokenInfo, raw: U256) -> Self {
        Self {
            chain: chain.to_string(),
            token: token.name.clone(),
            raw: raw.to_string(),
            decimals: token.decimals,
            formatted: format_units(raw, token.decimals),
        }
    }
}

/// Result of `head`
#[derive(Debug, Clone, Serialize)]
pub struct Head {
    pub chain: String,
    pub height: u64,
}

/// Renders `raw` with `decimals` fractional digits, trailing zeros trimmed
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}
