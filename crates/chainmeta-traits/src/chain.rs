//! Chain configuration rows and the backend enumeration.

use chainmeta_error::{ChainMetaError, Result};
use serde::{Deserialize, Serialize};

/// Which ledger's RPC and encoding rules apply to a chain.
///
/// Stored as a small integer in the chain table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum BackendKind {
    /// Account-model EVM chain
    Evm,
    /// Starknet
    Starknet,
    /// Solana
    Solana,
    /// Bitcoin
    Bitcoin,
    /// zkSync-lite style EVM rollup
    ZkLiteEvm,
    /// TON
    Ton,
    /// Cosmos SDK chain
    Cosmos,
    /// Anything else, keeping the stored code
    Other(i32),
}

impl BackendKind {
    /// Decodes the stored backend code
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => BackendKind::Evm,
            2 => BackendKind::Starknet,
            3 => BackendKind::Solana,
            4 => BackendKind::Bitcoin,
            5 => BackendKind::ZkLiteEvm,
            6 => BackendKind::Ton,
            7 => BackendKind::Cosmos,
            other => BackendKind::Other(other),
        }
    }

    /// Returns the stored backend code
    pub fn code(self) -> i32 {
        match self {
            BackendKind::Evm => 1,
            BackendKind::Starknet => 2,
            BackendKind::Solana => 3,
            BackendKind::Bitcoin => 4,
            BackendKind::ZkLiteEvm => 5,
            BackendKind::Ton => 6,
            BackendKind::Cosmos => 7,
            BackendKind::Other(code) => code,
        }
    }
}

impl From<i32> for BackendKind {
    fn from(code: i32) -> Self {
        BackendKind::from_code(code)
    }
}

impl From<BackendKind> for i32 {
    fn from(kind: BackendKind) -> Self {
        kind.code()
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Evm => write!(f, "evm"),
            BackendKind::Starknet => write!(f, "starknet"),
            BackendKind::Solana => write!(f, "solana"),
            BackendKind::Bitcoin => write!(f, "bitcoin"),
            BackendKind::ZkLiteEvm => write!(f, "zk-lite-evm"),
            BackendKind::Ton => write!(f, "ton"),
            BackendKind::Cosmos => write!(f, "cosmos"),
            BackendKind::Other(code) => write!(f, "other({code})"),
        }
    }
}

/// One chain row as the row store returns it, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainRow {
    /// Numeric identifier
    pub id: i64,
    /// External chain identifier, e.g. `"1"` or `"101"`
    pub chain_id: String,
    /// Chain id used on the wire, when it differs from `chain_id`
    pub real_chain_id: String,
    /// Display name
    pub name: String,
    /// Alias / long name
    pub alias_name: String,
    /// Stored backend code
    pub backend: i32,
    /// EIP-1559 fee market support
    pub eip1559: bool,
    /// Compact numeric key
    pub network_code: i32,
    /// Icon URL
    pub icon: String,
    /// Average block interval in milliseconds
    pub block_interval: i32,
    /// RPC endpoint used for the backend client
    pub rpc_endpoint: String,
    /// Block explorer URL
    pub explorer_url: String,
    /// Public RPC advertised to users
    pub official_rpc: String,
    /// Row is disabled
    pub disabled: bool,
    /// Row describes a testnet
    pub is_testnet: bool,
    /// Ordering weight for listings
    pub order_weight: i32,
    /// Native asset symbol
    pub gas_token_name: String,
    /// Native asset precision
    pub gas_token_decimal: i32,
    /// Bridge transfer contract
    pub transfer_contract_address: Option<String>,
    /// Bridge deposit contract
    pub deposit_contract_address: Option<String>,
    /// Parent chain reference
    pub layer1: Option<String>,
}

/// A validated chain configuration.
///
/// All string columns are trimmed; blank optional columns are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Numeric identifier
    pub id: i64,
    /// External chain identifier
    pub chain_id: String,
    /// Chain id used on the wire
    pub real_chain_id: String,
    /// Display name
    pub name: String,
    /// Alias / long name
    pub alias_name: String,
    /// Backend kind
    pub backend: BackendKind,
    /// EIP-1559 fee market support
    pub eip1559: bool,
    /// Compact numeric key
    pub network_code: i32,
    /// Icon URL
    pub icon: String,
    /// Average block interval in milliseconds
    pub block_interval: i32,
    /// RPC endpoint used for the backend client
    pub rpc_endpoint: String,
    /// Block explorer URL
    pub explorer_url: String,
    /// Public RPC advertised to users
    pub official_rpc: String,
    /// Row is disabled
    pub disabled: bool,
    /// Row describes a testnet
    pub is_testnet: bool,
    /// Ordering weight
    pub order_weight: i32,
    /// Native asset symbol
    pub gas_token_name: String,
    /// Native asset precision
    pub gas_token_decimals: u8,
    /// Bridge transfer contract
    pub transfer_contract_address: Option<String>,
    /// Bridge deposit contract
    pub deposit_contract_address: Option<String>,
    /// Parent chain reference
    pub layer1: Option<String>,
}

fn trimmed(value: String) -> String {
    let t = value.trim();
    if t.len() == value.len() {
        value
    } else {
        t.to_string()
    }
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value.map(trimmed).filter(|v| !v.is_empty())
}

impl ChainConfig {
    /// Validates and normalizes a raw row.
    ///
    /// # Errors
    ///
    /// Returns [`ChainMetaError::InvalidChainRow`] when the chain id or name
    /// is blank, or when the native precision does not fit in a `u8`.
    pub fn from_row(row: ChainRow) -> Result<Self> {
        let id = row.id;
        let invalid = |reason: &str| ChainMetaError::InvalidChainRow {
            id,
            reason: reason.to_string(),
        };

        if row.chain_id.trim().is_empty() {
            return Err(invalid("empty chain_id"));
        }
        if row.name.trim().is_empty() {
            return Err(invalid("empty name"));
        }
        let gas_token_decimals = u8::try_from(row.gas_token_decimal)
            .map_err(|_| invalid(&format!("gas token decimals {} out of range", row.gas_token_decimal)))?;

        Ok(Self {
            id,
            chain_id: trimmed(row.chain_id),
            real_chain_id: trimmed(row.real_chain_id),
            name: trimmed(row.name),
            alias_name: trimmed(row.alias_name),
            backend: BackendKind::from_code(row.backend),
            eip1559: row.eip1559,
            network_code: row.network_code,
            icon: trimmed(row.icon),
            block_interval: row.block_interval,
            rpc_endpoint: trimmed(row.rpc_endpoint),
            explorer_url: trimmed(row.explorer_url),
            official_rpc: trimmed(row.official_rpc),
            disabled: row.disabled,
            is_testnet: row.is_testnet,
            order_weight: row.order_weight,
            gas_token_name: trimmed(row.gas_token_name),
            gas_token_decimals,
            transfer_contract_address: trimmed_opt(row.transfer_contract_address),
            deposit_contract_address: trimmed_opt(row.deposit_contract_address),
            layer1: trimmed_opt(row.layer1),
        })
    }

    /// True unless the row is disabled
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// External chain id parsed as `i64`
    pub fn chain_id_i64(&self) -> Option<i64> {
        self.chain_id.parse().ok()
    }

    /// External chain id parsed as `i32`
    pub fn chain_id_i32(&self) -> Option<i32> {
        self.chain_id.parse().ok()
    }
}
