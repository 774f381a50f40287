//! EVM chain-RPC behaviour against a mocked JSON-RPC node.
//!
//! Run with: `cargo test -p chainmeta_evm --test token_resolution`

use std::sync::Arc;

use alloy::primitives::{Bytes, U256};
use chainmeta_cache::{loader_fn, CacheConfig, RefreshAheadCache};
use chainmeta_error::{ChainMetaError, ErrorKind};
use chainmeta_evm::{EvmClient, EvmRpc};
use chainmeta_resilience::RpcContext;
use chainmeta_traits::{ChainConfig, ChainRow, ChainRpc, TokenInfo, TokenInfoCache};
use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
const OWNER: &str = "0x00000000219ab540356cBB839Cbe05303d7705Fa";
const ZERO: &str = "0x0000000000000000000000000000000000000000";

fn word(value: u64) -> Vec<u8> {
    U256::from(value).to_be_bytes::<32>().to_vec()
}

fn abi_string(value: &str) -> Vec<u8> {
    let mut out = word(32);
    out.extend(word(value.len() as u64));
    let mut data = value.as_bytes().to_vec();
    data.resize(value.len().div_ceil(32) * 32, 0);
    out.extend(data);
    out
}

fn hex(data: Vec<u8>) -> Value {
    json!(Bytes::from(data).to_string())
}

/// Answers every JSON-RPC call in a request, batched or not
struct FakeNode {
    symbol: &'static str,
    decimals: u64,
    name: &'static str,
    supply: u64,
    balance: u64,
    head: u64,
    /// Every `eth_call` answers with `execution reverted`
    reverts: bool,
    /// `status` of the mined receipt; `None` means the hash is unknown
    receipt_status: Option<u64>,
}

impl FakeNode {
    fn usdc() -> Self {
        Self {
            symbol: "USDC",
            decimals: 6,
            name: "USD Coin",
            supply: 1_000_000,
            balance: 250,
            head: 0x1234,
            reverts: false,
            receipt_status: None,
        }
    }

    fn receipt(&self, hash: &Value) -> Value {
        let Some(status) = self.receipt_status else {
            return Value::Null;
        };
        json!({
            "type": "0x2",
            "status": format!("{status:#x}"),
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": hash,
            "transactionIndex": "0x0",
            "blockHash": format!("0x{}", "ab".repeat(32)),
            "blockNumber": "0x112a880",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": OWNER,
            "to": USDC,
            "contractAddress": null
        })
    }

    fn answer(&self, call: &Value) -> Value {
        let id = call["id"].clone();
        let result = match call["method"].as_str().unwrap_or_default() {
            "eth_call" if self.reverts => {
                return json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": 3, "message": "execution reverted", "data": "0x" }
                })
            }
            "eth_call" => {
                let params = &call["params"][0];
                let input = params["input"]
                    .as_str()
                    .or_else(|| params["data"].as_str())
                    .unwrap_or("0x");
                match input.get(..10).unwrap_or(input) {
                    "0x95d89b41" => hex(abi_string(self.symbol)),
                    "0x313ce567" => hex(word(self.decimals)),
                    "0x06fdde03" => hex(abi_string(self.name)),
                    "0x18160ddd" => hex(word(self.supply)),
                    "0x70a08231" => hex(word(self.balance)),
                    _ => json!("0x"),
                }
            }
            "eth_getBalance" => json!("0x2a"),
            "eth_blockNumber" => json!(format!("{:#x}", self.head)),
            "eth_getTransactionReceipt" => self.receipt(&call["params"][0]),
            other => {
                return json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32601, "message": format!("{other} not mocked") }
                })
            }
        };
        json!({ "jsonrpc": "2.0", "id": id, "result": result })
    }
}

impl Respond for FakeNode {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let reply = match &body {
            Value::Array(calls) => Value::Array(calls.iter().map(|c| self.answer(c)).collect()),
            call => self.answer(call),
        };
        ResponseTemplate::new(200).set_body_json(reply)
    }
}

fn chain(endpoint: &str) -> Arc<ChainConfig> {
    Arc::new(
        ChainConfig::from_row(ChainRow {
            id: 1,
            chain_id: "1".into(),
            name: "ethereum".into(),
            alias_name: "Ethereum".into(),
            backend: 1,
            network_code: 100,
            rpc_endpoint: endpoint.into(),
            explorer_url: "https://etherscan.io".into(),
            gas_token_name: "ETH".into(),
            gas_token_decimal: 18,
            ..ChainRow::default()
        })
        .unwrap(),
    )
}

fn token_cache() -> TokenInfoCache {
    RefreshAheadCache::new(
        "onchain-tokens",
        CacheConfig::default(),
        loader_fn(|key: String| async move {
            Err::<TokenInfo, _>(ChainMetaError::InvalidCacheKey(key))
        }),
    )
    .unwrap()
}

async fn setup(node: FakeNode) -> (MockServer, EvmRpc, TokenInfoCache) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(node)
        .mount(&server)
        .await;

    let client = Arc::new(EvmClient::connect(&server.uri()).unwrap());
    let cache = token_cache();
    let rpc = EvmRpc::new(chain(&server.uri()), client, cache.clone());
    (server, rpc, cache)
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn test_token_info_uses_one_batched_request() {
    let (server, rpc, cache) = setup(FakeNode::usdc()).await;
    let ctx = RpcContext::background();

    let info = rpc.get_token_info(&ctx, USDC).await.unwrap();
    assert_eq!(info.name, "USDC");
    assert_eq!(info.full_name, "USD Coin");
    assert_eq!(info.decimals, 6);
    assert_eq!(info.total_supply, U256::from(1_000_000u64));
    assert_eq!(info.address, USDC);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(4));

    assert!(cache.contains_key("ethereum#0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
}

#[tokio::test]
async fn test_token_info_second_call_is_cached() {
    let (server, rpc, _cache) = setup(FakeNode::usdc()).await;
    let ctx = RpcContext::background();

    rpc.get_token_info(&ctx, USDC).await.unwrap();
    let lowercase = USDC.to_lowercase();
    let again = rpc.get_token_info(&ctx, &lowercase).await.unwrap();
    assert_eq!(again.name, "USDC");
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_zero_decimals_rejected_and_not_cached() {
    let node = FakeNode {
        decimals: 0,
        ..FakeNode::usdc()
    };
    let (_server, rpc, cache) = setup(node).await;

    let err = rpc
        .get_token_info(&RpcContext::background(), USDC)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_reverting_contract_is_not_found() {
    let node = FakeNode {
        reverts: true,
        ..FakeNode::usdc()
    };
    let (_server, rpc, cache) = setup(node).await;

    let err = rpc
        .get_token_info(&RpcContext::background(), USDC)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.is_retryable());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_reverting_balance_call_is_not_retryable() {
    let node = FakeNode {
        reverts: true,
        ..FakeNode::usdc()
    };
    let (_server, rpc, _cache) = setup(node).await;

    let err = rpc
        .get_balance(&RpcContext::background(), OWNER, USDC)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainMetaError::RpcRejected { code: 3, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_oversized_decimals_rejected() {
    let node = FakeNode {
        decimals: 300,
        ..FakeNode::usdc()
    };
    let (_server, rpc, _cache) = setup(node).await;

    let err = rpc
        .get_token_info(&RpcContext::background(), USDC)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainMetaError::TokenNotFound { .. }));
}

#[tokio::test]
async fn test_lowercase_input_resolves_to_checksummed_address() {
    let (_server, rpc, _cache) = setup(FakeNode::usdc()).await;

    let info = rpc
        .get_token_info(&RpcContext::background(), &USDC.to_lowercase())
        .await
        .unwrap();
    assert_eq!(info.address, USDC);
}

#[tokio::test]
async fn test_refresh_with_lowercase_key_keeps_checksummed_address() {
    let (server, rpc, _cache) = setup(FakeNode::usdc()).await;
    let ctx = RpcContext::background();

    // Background refresh re-resolves from the cache key, which is lowercased
    let refreshed = rpc
        .client()
        .fetch_token_info(&ctx, &chain(&server.uri()), &USDC.to_lowercase())
        .await
        .unwrap();
    let foreground = rpc.get_token_info(&ctx, USDC).await.unwrap();
    assert_eq!(refreshed.address, USDC);
    assert_eq!(refreshed, foreground);
}

#[tokio::test]
async fn test_native_sentinel_makes_no_request() {
    let (server, rpc, cache) = setup(FakeNode::usdc()).await;

    let info = rpc
        .get_token_info(&RpcContext::background(), ZERO)
        .await
        .unwrap();
    assert_eq!(info.name, "ETH");
    assert_eq!(info.decimals, 18);
    assert_eq!(info.full_name, "Ethereum");
    assert_eq!(request_count(&server).await, 0);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_balances() {
    let (_server, rpc, _cache) = setup(FakeNode::usdc()).await;
    let ctx = RpcContext::background();

    let native = rpc.get_balance(&ctx, OWNER, ZERO).await.unwrap();
    assert_eq!(native, U256::from(42u64));

    let token = rpc.get_balance(&ctx, OWNER, USDC).await.unwrap();
    assert_eq!(token, U256::from(250u64));

    let historical = rpc.get_balance_at(&ctx, OWNER, ZERO, 17_000_000).await.unwrap();
    assert_eq!(historical, U256::from(42u64));
}

#[tokio::test]
async fn test_head_and_missing_receipt() {
    let (_server, rpc, _cache) = setup(FakeNode::usdc()).await;
    let ctx = RpcContext::background();

    assert_eq!(rpc.get_latest_block_height(&ctx).await.unwrap(), 0x1234);

    let status = rpc
        .is_transaction_successful(
            &ctx,
            "0xe4216d69bf935587b82243e68189de7ade0aa5b6f70dd0de8636b8d643431c0b",
        )
        .await
        .unwrap();
    assert!(!status.success);
    assert_eq!(status.block_height, None);
}

#[tokio::test]
async fn test_mined_receipt_status() {
    let hash = "0xe4216d69bf935587b82243e68189de7ade0aa5b6f70dd0de8636b8d643431c0b";
    let ctx = RpcContext::background();

    let (_server, rpc, _cache) = setup(FakeNode {
        receipt_status: Some(1),
        ..FakeNode::usdc()
    })
    .await;
    let status = rpc.is_transaction_successful(&ctx, hash).await.unwrap();
    assert!(status.success);
    assert_eq!(status.block_height, Some(0x112a880));

    let (_server, rpc, _cache) = setup(FakeNode {
        receipt_status: Some(0),
        ..FakeNode::usdc()
    })
    .await;
    let status = rpc.is_transaction_successful(&ctx, hash).await.unwrap();
    assert!(!status.success);
    assert_eq!(status.block_height, Some(0x112a880));
}

#[tokio::test]
async fn test_malformed_inputs_are_decode_errors() {
    let (server, rpc, _cache) = setup(FakeNode::usdc()).await;
    let ctx = RpcContext::background();

    let err = rpc.get_token_info(&ctx, "0xnot-hex").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    let err = rpc.is_transaction_successful(&ctx, "0x12").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_cancelled_context() {
    let (_server, rpc, cache) = setup(FakeNode::usdc()).await;
    let ctx = RpcContext::background();
    ctx.cancel();

    let err = rpc.get_token_info(&ctx, USDC).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(cache.is_empty());
}
