//! Signature status and head slot against a mocked Solana node.
//!
//! Run with: `cargo test -p chainmeta_solana --test signature_status`

use chainmeta_error::{ChainMetaError, ErrorKind};
use chainmeta_resilience::RpcContext;
use chainmeta_solana::SolanaClient;
use serde_json::{json, Value};
use solana_sdk::signature::Signature;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LANDED_SLOT: u64 = 251_442_090;

fn signature() -> String {
    Signature::from([7u8; 64]).to_string()
}

fn statuses(entry: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": { "context": { "slot": LANDED_SLOT + 40 }, "value": [entry] }
    })
}

async fn node(reply: Value) -> (MockServer, SolanaClient) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getSignatureStatuses" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;
    let client = SolanaClient::new(&server.uri());
    (server, client)
}

#[tokio::test]
async fn test_executed_signature_is_successful() {
    let (_server, client) = node(statuses(json!({
        "slot": LANDED_SLOT,
        "confirmations": null,
        "err": null,
        "status": { "Ok": null },
        "confirmationStatus": "finalized"
    })))
    .await;

    let status = client
        .transaction_status(&RpcContext::background(), &signature())
        .await
        .unwrap();
    assert!(status.success);
    assert_eq!(status.block_height, Some(LANDED_SLOT));
}

#[tokio::test]
async fn test_failed_signature_keeps_its_slot() {
    let (_server, client) = node(statuses(json!({
        "slot": LANDED_SLOT,
        "confirmations": 3,
        "err": "InsufficientFundsForFee",
        "status": { "Err": "InsufficientFundsForFee" },
        "confirmationStatus": "confirmed"
    })))
    .await;

    let status = client
        .transaction_status(&RpcContext::background(), &signature())
        .await
        .unwrap();
    assert!(!status.success);
    assert_eq!(status.block_height, Some(LANDED_SLOT));
}

#[tokio::test]
async fn test_unknown_signature_is_not_found() {
    let (_server, client) = node(statuses(Value::Null)).await;

    let status = client
        .transaction_status(&RpcContext::background(), &signature())
        .await
        .unwrap();
    assert!(!status.success);
    assert_eq!(status.block_height, None);
}

#[tokio::test]
async fn test_node_error_object_is_not_retryable() {
    let (_server, client) = node(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": { "code": -32602, "message": "Invalid param: too many signatures" }
    }))
    .await;

    let err = client
        .transaction_status(&RpcContext::background(), &signature())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainMetaError::RpcRejected { code: -32602, .. }), "{err}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_malformed_signature_makes_no_request() {
    let (server, client) = node(statuses(Value::Null)).await;

    let err = client
        .transaction_status(&RpcContext::background(), "not-a-signature")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_finalized_slot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getSlot" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": LANDED_SLOT
        })))
        .mount(&server)
        .await;

    let client = SolanaClient::new(&server.uri());
    let slot = client.finalized_slot(&RpcContext::background()).await.unwrap();
    assert_eq!(slot, LANDED_SLOT);
}
