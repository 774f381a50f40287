use std::str::FromStr;

use alloy::network::ReceiptResponse as _;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::{BatchRequest, Waiter};
use alloy::rpc::types::{BlockId, TransactionInput, TransactionRequest};
use alloy::transports::{RpcError, TransportError};
use chainmeta_error::{ChainMetaError, Result};
use chainmeta_resilience::RpcContext;
use chainmeta_traits::{ChainConfig, TokenInfo, TxStatus};
use tracing::{debug, trace};

use crate::erc20::{metadata_calldata, token_info_from_returns, Erc20Returns, ERC20};

/// Parses an EVM address, reporting failures as decode errors
pub fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address.trim()).map_err(|e| ChainMetaError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a 32-byte transaction hash
pub fn parse_tx_hash(hash: &str) -> Result<B256> {
    B256::from_str(hash.trim()).map_err(|e| ChainMetaError::InvalidHash {
        hash: hash.to_string(),
        reason: e.to_string(),
    })
}

/// Splits node-side error objects from failures to reach the node.
///
/// Only the latter are transport errors; a revert or an invalid-params reply
/// comes back the same on every retry.
fn transport_error(method: &str, err: TransportError) -> ChainMetaError {
    match err {
        RpcError::ErrorResp(payload) => {
            ChainMetaError::rpc_rejected(method, payload.code, payload.message.to_string())
        }
        other => ChainMetaError::rpc(method, other),
    }
}

fn contract_error(method: &str, err: alloy::contract::Error) -> ChainMetaError {
    match err {
        alloy::contract::Error::TransportError(e) => transport_error(method, e),
        other => ChainMetaError::decode(method, other),
    }
}

/// JSON-RPC code geth and most clients use for `execution reverted`
const EXECUTION_REVERTED: i64 = 3;

/// A reverted metadata call reads as "no data", like a call to an address
/// without code.
fn call_result(waited: std::result::Result<Bytes, TransportError>) -> Result<Bytes> {
    match waited {
        Ok(data) => Ok(data),
        Err(RpcError::ErrorResp(payload))
            if payload.code == EXECUTION_REVERTED || payload.message.contains("revert") =>
        {
            trace!(code = payload.code, message = %payload.message, "metadata call reverted");
            Ok(Bytes::new())
        }
        Err(e) => Err(transport_error("eth_call", e)),
    }
}

/// A long-lived connection to one EVM JSON-RPC endpoint.
///
/// Read-only: the provider is built without fillers, so nothing here can
/// sign or send a transaction.
#[derive(Clone)]
pub struct EvmClient {
    provider: DynProvider,
    endpoint: String,
}

impl std::fmt::Debug for EvmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl EvmClient {
    /// Creates a client for `endpoint`. No request is made until first use.
    ///
    /// # Errors
    ///
    /// [`ChainMetaError::Config`] if the endpoint is not a valid URL.
    pub fn connect(endpoint: &str) -> Result<Self> {
        let url = url::Url::parse(endpoint)
            .map_err(|e| ChainMetaError::Config(format!("invalid EVM endpoint '{endpoint}': {e}")))?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url)
            .erased();
        Ok(Self {
            provider,
            endpoint: endpoint.to_string(),
        })
    }

    /// Endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The underlying alloy provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Reads `symbol`, `decimals`, `name` and `totalSupply` in one batched
    /// request and builds token info from the results. The address in the
    /// result is always the EIP-55 checksummed form.
    ///
    /// # Errors
    ///
    /// Transport errors from the batch, decode errors for malformed returns
    /// or non-revert error replies, and [`ChainMetaError::TokenNotFound`]
    /// when the contract reverts or does not look like an ERC-20 token.
    pub async fn fetch_token_info(
        &self,
        ctx: &RpcContext,
        chain: &ChainConfig,
        address: &str,
    ) -> Result<TokenInfo> {
        let token = parse_address(address)?;
        let returns = ctx
            .run("erc20_metadata", self.metadata_batch(token))
            .await?;
        debug!(chain = %chain.name, token = %token, "resolved erc20 metadata");
        token_info_from_returns(chain, &token.to_checksum(None), &returns)
    }

    async fn metadata_batch(&self, token: Address) -> Result<Erc20Returns> {
        let rpc_err = |e: TransportError| transport_error("eth_call", e);
        let mut batch = BatchRequest::new(self.provider.client());
        let mut waiters: Vec<Waiter<Bytes>> = Vec::with_capacity(4);
        for calldata in metadata_calldata() {
            let request = TransactionRequest::default()
                .to(token)
                .input(TransactionInput::new(calldata));
            waiters.push(
                batch
                    .add_call("eth_call", &(request, BlockId::latest()))
                    .map_err(rpc_err)?,
            );
        }
        batch.send().await.map_err(rpc_err)?;

        let mut results = Vec::with_capacity(4);
        for waiter in waiters {
            results.push(call_result(waiter.await)?);
        }
        let mut results = results.into_iter();
        let mut next = || results.next().unwrap_or_default();
        Ok(Erc20Returns {
            symbol: next(),
            decimals: next(),
            name: next(),
            total_supply: next(),
        })
    }

    /// Native balance, optionally at a historical block
    pub async fn native_balance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        block: Option<u64>,
    ) -> Result<U256> {
        let owner = parse_address(owner)?;
        let block = block.map(BlockId::number).unwrap_or_else(BlockId::latest);
        ctx.run("eth_getBalance", async {
            self.provider
                .get_balance(owner)
                .block_id(block)
                .await
                .map_err(|e| transport_error("eth_getBalance", e))
        })
        .await
    }

    /// `balanceOf(owner)` on `token`, optionally at a historical block.
    ///
    /// A contract call that returns no data (no code at `token`) reads as
    /// a zero balance.
    pub async fn token_balance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        block: Option<u64>,
    ) -> Result<U256> {
        let owner = parse_address(owner)?;
        let token = parse_address(token)?;
        let block = block.map(BlockId::number).unwrap_or_else(BlockId::latest);
        let contract = ERC20::new(token, self.provider.clone());
        ctx.run("balanceOf", async move {
            match contract.balanceOf(owner).block(block).call().await {
                Ok(balance) => Ok(balance),
                Err(alloy::contract::Error::ZeroData(..)) => {
                    debug!(token = %token, "balanceOf returned no data");
                    Ok(U256::ZERO)
                }
                Err(e) => Err(contract_error("balanceOf", e)),
            }
        })
        .await
    }

    /// `allowance(owner, spender)` on `token`
    pub async fn allowance(
        &self,
        ctx: &RpcContext,
        owner: &str,
        token: &str,
        spender: &str,
    ) -> Result<U256> {
        let owner = parse_address(owner)?;
        let token = parse_address(token)?;
        let spender = parse_address(spender)?;
        let contract = ERC20::new(token, self.provider.clone());
        ctx.run("allowance", async move {
            match contract.allowance(owner, spender).call().await {
                Ok(allowance) => Ok(allowance),
                Err(alloy::contract::Error::ZeroData(..)) => Ok(U256::ZERO),
                Err(e) => Err(contract_error("allowance", e)),
            }
        })
        .await
    }

    /// Receipt status and block number; an unknown hash is not successful
    pub async fn transaction_status(&self, ctx: &RpcContext, hash: &str) -> Result<TxStatus> {
        let hash = parse_tx_hash(hash)?;
        let receipt = ctx
            .run("eth_getTransactionReceipt", async {
                self.provider
                    .get_transaction_receipt(hash)
                    .await
                    .map_err(|e| transport_error("eth_getTransactionReceipt", e))
            })
            .await?;

        Ok(match receipt {
            Some(receipt) => TxStatus {
                success: receipt.status(),
                block_height: receipt.block_number,
            },
            None => {
                debug!(hash = %hash, "no receipt");
                TxStatus::not_found()
            }
        })
    }

    /// Latest block number
    pub async fn block_number(&self, ctx: &RpcContext) -> Result<u64> {
        ctx.run("eth_blockNumber", async {
            self.provider
                .get_block_number()
                .await
                .map_err(|e| transport_error("eth_blockNumber", e))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainmeta_error::ErrorKind;

    #[test]
    fn test_parse_address() {
        let addr = parse_address(" 0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48 ").unwrap();
        assert_eq!(
            format!("{addr:#x}"),
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
        let err = parse_address("0x1234").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(parse_address("not an address").is_err());
    }

    #[test]
    fn test_parse_tx_hash() {
        assert!(parse_tx_hash(
            "0xe4216d69bf935587b82243e68189de7ade0aa5b6f70dd0de8636b8d643431c0b"
        )
        .is_ok());
        let err = parse_tx_hash("0xe421").unwrap_err();
        assert!(matches!(err, ChainMetaError::InvalidHash { .. }));
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        let client = EvmClient::connect("http://127.0.0.1:1").unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:1");
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let err = EvmClient::connect("not a url").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_bad_owner_fails_before_network() {
        let client = EvmClient::connect("http://127.0.0.1:1").unwrap();
        let err = client
            .native_balance(&RpcContext::background(), "0xnope", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainMetaError::InvalidAddress { .. }));
    }

    #[tokio::test]
    #[ignore = "needs network access to a public Ethereum node"]
    async fn test_mainnet_usdc_metadata() {
        let client = EvmClient::connect("https://eth.llamarpc.com").unwrap();
        let ctx = RpcContext::with_timeout(std::time::Duration::from_secs(10));
        let chain = ChainConfig::from_row(chainmeta_traits::ChainRow {
            id: 1,
            chain_id: "1".into(),
            name: "ethereum".into(),
            backend: 1,
            gas_token_name: "ETH".into(),
            gas_token_decimal: 18,
            ..Default::default()
        })
        .unwrap();
        let info = client
            .fetch_token_info(&ctx, &chain, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")
            .await
            .unwrap();
        assert_eq!(info.name, "USDC");
        assert_eq!(info.decimals, 6);
    }
}
