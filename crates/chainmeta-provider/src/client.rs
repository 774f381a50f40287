//! Backend client handles and the factory that builds them.

use std::sync::Arc;

use async_trait::async_trait;
use chainmeta_error::Result;
use chainmeta_evm::EvmClient;
use chainmeta_solana::SolanaClient;
use chainmeta_traits::BackendKind;
use tracing::debug;

use crate::config::{parse_endpoint, ProviderConfig};
use crate::jsonrpc::{JsonRpcHandle, RpcClient};

/// A connected client for one chain, one variant per backend that has one
#[derive(Debug, Clone)]
pub enum BackendClient {
    /// EVM JSON-RPC provider
    Evm(Arc<EvmClient>),
    /// Solana nonblocking RPC client
    Solana(Arc<SolanaClient>),
    /// Raw JSON-RPC handle (Starknet)
    Starknet(JsonRpcHandle),
    /// No client: disabled rows and backends chainmeta only registers
    Detached,
}

impl BackendClient {
    /// EVM handle, if this is one
    pub fn as_evm(&self) -> Option<&Arc<EvmClient>> {
        match self {
            BackendClient::Evm(client) => Some(client),
            _ => None,
        }
    }

    /// Solana handle, if this is one
    pub fn as_solana(&self) -> Option<&Arc<SolanaClient>> {
        match self {
            BackendClient::Solana(client) => Some(client),
            _ => None,
        }
    }

    /// Raw JSON-RPC handle, if this is one
    pub fn as_json_rpc(&self) -> Option<&JsonRpcHandle> {
        match self {
            BackendClient::Starknet(handle) => Some(handle),
            _ => None,
        }
    }

    /// True for [`BackendClient::Detached`]
    pub fn is_detached(&self) -> bool {
        matches!(self, BackendClient::Detached)
    }

    /// Endpoint of the underlying client
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            BackendClient::Evm(client) => Some(client.endpoint()),
            BackendClient::Solana(client) => Some(client.endpoint()),
            BackendClient::Starknet(handle) => Some(handle.endpoint()),
            BackendClient::Detached => None,
        }
    }
}

/// Builds a client handle for a backend and endpoint
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Called once per enabled chain row during reload.
    ///
    /// # Errors
    ///
    /// A configuration error for an unusable endpoint. The registry skips
    /// the row.
    async fn build_client(&self, backend: BackendKind, endpoint: &str) -> Result<BackendClient>;
}

/// Factory for the backends chainmeta ships clients for
#[derive(Debug)]
pub struct DefaultClientFactory {
    config: ProviderConfig,
    json_rpc: Arc<RpcClient>,
}

impl DefaultClientFactory {
    /// Creates a factory.
    ///
    /// # Errors
    ///
    /// [`chainmeta_error::ChainMetaError::Config`] if `config` does not validate.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let json_rpc = Arc::new(RpcClient::with_config(
            &config.http,
            config.request_timeout(),
            config.rate_limit,
        )?);
        Ok(Self { config, json_rpc })
    }

    /// Factory settings
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl ClientFactory for DefaultClientFactory {
    async fn build_client(&self, backend: BackendKind, endpoint: &str) -> Result<BackendClient> {
        if !matches!(
            backend,
            BackendKind::Evm | BackendKind::Solana | BackendKind::Starknet
        ) {
            return Ok(BackendClient::Detached);
        }

        let url = parse_endpoint(endpoint)?;
        debug!(%backend, endpoint = %url, "building backend client");
        let client = match backend {
            BackendKind::Evm => BackendClient::Evm(Arc::new(EvmClient::connect(url.as_str())?)),
            BackendKind::Solana => BackendClient::Solana(Arc::new(
                SolanaClient::new_with_commitment(url.as_str(), self.config.commitment()?),
            )),
            BackendKind::Starknet => {
                BackendClient::Starknet(JsonRpcHandle::new(Arc::clone(&self.json_rpc), url))
            }
            _ => BackendClient::Detached,
        };
        Ok(client)
    }
}
