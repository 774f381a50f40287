use std::str::FromStr;

use async_trait::async_trait;
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_resilience::RpcContext;
use chainmeta_traits::TxStatus;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcError;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::debug;

use crate::source::AccountSource;

/// Parses a base58 transaction signature
pub fn parse_signature(signature: &str) -> Result<Signature> {
    Signature::from_str(signature.trim()).map_err(|e| ChainMetaError::InvalidHash {
        hash: signature.to_string(),
        reason: e.to_string(),
    })
}

/// Node error objects come back the same on retry; everything else is a
/// transport failure.
fn client_error(method: &str, err: ClientError) -> ChainMetaError {
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) = err.kind() {
        return ChainMetaError::rpc_rejected(method, *code, message.clone());
    }
    ChainMetaError::rpc(method, err)
}

/// A client for reading the Solana blockchain via an RPC endpoint.
///
/// Account reads use the configured commitment (`confirmed` by default);
/// the head height is always the finalized slot.
pub struct SolanaClient {
    rpc_client: RpcClient,
    endpoint: String,
    commitment_level: CommitmentConfig,
}

impl std::fmt::Debug for SolanaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaClient")
            .field("endpoint", &self.endpoint)
            .field("commitment", &self.commitment_level.commitment)
            .finish()
    }
}

impl SolanaClient {
    /// Creates a new `SolanaClient` with the default commitment level (`confirmed`).
    pub fn new(endpoint: &str) -> Self {
        Self::new_with_commitment(endpoint, CommitmentConfig::confirmed())
    }

    /// Creates a new `SolanaClient` with a specified commitment level.
    pub fn new_with_commitment(endpoint: &str, commitment: CommitmentConfig) -> Self {
        let rpc_client = RpcClient::new_with_commitment(endpoint.to_string(), commitment);
        Self {
            rpc_client,
            endpoint: endpoint.to_string(),
            commitment_level: commitment,
        }
    }

    /// Returns the underlying `RpcClient`.
    pub fn rpc_client(&self) -> &RpcClient {
        &self.rpc_client
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the current commitment level.
    pub fn commitment_level(&self) -> &CommitmentConfig {
        &self.commitment_level
    }

    /// Execution status of a transaction.
    ///
    /// A signature the node has never seen reports [`TxStatus::not_found`].
    pub async fn transaction_status(&self, ctx: &RpcContext, signature: &str) -> Result<TxStatus> {
        let signature = parse_signature(signature)?;
        ctx.run("getSignatureStatuses", async {
            let statuses = self
                .rpc_client
                .get_signature_statuses_with_history(&[signature])
                .await
                .map_err(|e| client_error("getSignatureStatuses", e))?;
            let status = statuses.value.into_iter().next().flatten();
            Ok(match status {
                Some(status) => TxStatus {
                    success: status.err.is_none(),
                    block_height: Some(status.slot),
                },
                None => {
                    debug!(%signature, "signature not found");
                    TxStatus::not_found()
                }
            })
        })
        .await
    }

    /// Latest finalized slot
    pub async fn finalized_slot(&self, ctx: &RpcContext) -> Result<u64> {
        ctx.run("getSlot", async {
            self.rpc_client
                .get_slot_with_commitment(CommitmentConfig::finalized())
                .await
                .map_err(|e| client_error("getSlot", e))
        })
        .await
    }
}

#[async_trait]
impl AccountSource for SolanaClient {
    async fn account_data(&self, ctx: &RpcContext, keys: &[Pubkey]) -> Result<Vec<Option<Vec<u8>>>> {
        ctx.run("getMultipleAccounts", async {
            let accounts = self
                .rpc_client
                .get_multiple_accounts_with_commitment(keys, self.commitment_level)
                .await
                .map_err(|e| client_error("getMultipleAccounts", e))?;
            Ok(accounts
                .value
                .into_iter()
                .map(|account| account.map(|a| a.data))
                .collect())
        })
        .await
    }

    async fn lamports(&self, ctx: &RpcContext, key: &Pubkey) -> Result<u64> {
        ctx.run("getBalance", async {
            let balance = self
                .rpc_client
                .get_balance_with_commitment(key, self.commitment_level)
                .await
                .map_err(|e| client_error("getBalance", e))?;
            Ok(balance.value)
        })
        .await
    }
}
