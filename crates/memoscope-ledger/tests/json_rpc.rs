//! `JsonRpcLedgerClient` against a mock node.

use std::num::NonZeroU32;
use std::time::Duration;

use memoscope_ledger::{
    AccountTxRequest, CheckpointWriter, FetchOptions, JsonRpcLedgerClient, LedgerError,
    LedgerRangeWalker, LedgerService, PaginationCursor, WalkRequest, encode_memo,
    validate_ledger_range,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUER: &str = "rIssuer1";

fn client(server: &MockServer) -> JsonRpcLedgerClient {
    JsonRpcLedgerClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn pft_payment(sender: &str, ledger_index: u32, memo: &str) -> Value {
    json!({
        "meta": {"TransactionResult": "tesSUCCESS"},
        "tx": {
            "TransactionType": "Payment",
            "Account": sender,
            "Destination": ISSUER,
            "Amount": {"currency": "PFT", "issuer": ISSUER, "value": "10"},
            "Memos": [{"Memo": {"MemoData": encode_memo(memo)}}],
            "hash": format!("H{ledger_index}"),
            "ledger_index": ledger_index,
            "date": 780_000_000u32
        },
        "validated": true
    })
}

fn rpc_ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": result }))
}

#[tokio::test]
async fn test_current_ledger_index_uses_validated_ledger() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "ledger",
            "params": [{"ledger_index": "validated"}]
        })))
        .respond_with(rpc_ok(json!({"ledger_index": 91_234_567, "status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let index = client(&server).current_ledger_index().await.unwrap();
    assert_eq!(index, 91_234_567);
}

#[tokio::test]
async fn test_account_tx_sends_marker_and_reads_next_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "account_tx",
            "params": [{
                "account": ISSUER,
                "ledger_index_min": 100,
                "ledger_index_max": 199,
                "forward": true,
                "marker": {"ledger": 150, "seq": 3}
            }]
        })))
        .respond_with(rpc_ok(json!({
            "transactions": [pft_payment("rA", 160, "second page")],
            "marker": {"ledger": 170, "seq": 0},
            "status": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = AccountTxRequest {
        account: ISSUER.into(),
        ledger_index_min: 100,
        ledger_index_max: 199,
        forward: true,
        limit: 50,
        cursor: Some(PaginationCursor(json!({"ledger": 150, "seq": 3}))),
    };
    let page = client(&server).account_transactions(&request).await.unwrap();
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].ledger_index, Some(160));
    assert_eq!(
        page.next_cursor,
        Some(PaginationCursor(json!({"ledger": 170, "seq": 0})))
    );
}

#[tokio::test]
async fn test_rpc_level_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_ok(json!({
            "error": "actNotFound",
            "error_message": "Account not found.",
            "status": "error"
        })))
        .mount(&server)
        .await;

    let err = client(&server).current_ledger_index().await.unwrap_err();
    match err {
        LedgerError::Rpc { code, message, .. } => {
            assert_eq!(code, "actNotFound");
            assert_eq!(message, "Account not found.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = client(&server).current_ledger_index().await.unwrap_err();
    assert!(matches!(err, LedgerError::Http { status: 503, ref body } if body == "slow down"));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server).current_ledger_index().await.unwrap_err();
    assert!(matches!(err, LedgerError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_slow_node_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_ok(json!({"ledger_index": 1})).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = JsonRpcLedgerClient::new(server.uri(), Duration::from_millis(50)).unwrap();
    let err = client.current_ledger_index().await.unwrap_err();
    assert!(matches!(err, LedgerError::Timeout(_)));
}

#[tokio::test]
async fn test_walk_over_json_rpc_follows_markers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "account_tx",
            "params": [{"marker": "page-2"}]
        })))
        .respond_with(rpc_ok(json!({
            "transactions": [pft_payment("rA", 180, "later")]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "account_tx"})))
        .respond_with(rpc_ok(json!({
            "transactions": [
                pft_payment("rA", 120, "earlier"),
                pft_payment("rB", 130, "hello")
            ],
            "marker": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let walker = LedgerRangeWalker::new(
        &client,
        FetchOptions {
            page_limit: 2,
            page_delay: Duration::ZERO,
        },
    );
    let dir = tempfile::tempdir().unwrap();
    let writer = CheckpointWriter::new(dir.path(), "memos", "PFT", ISSUER);
    let request = WalkRequest {
        currency: "PFT".into(),
        issuer: ISSUER.into(),
        start_ledger: 100,
        end_ledger: Some(200),
        window_size: NonZeroU32::new(1_000).unwrap(),
    };

    let index = walker.collect(&request, &writer).await.unwrap();
    let texts: Vec<_> = index["rA"].iter().map(|r| r.memo_text.as_str()).collect();
    assert_eq!(texts, ["earlier", "later"]);
    assert_eq!(index["rB"][0].memo_text, "hello");
}

#[tokio::test]
async fn test_validate_range_against_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "ledger"})))
        .respond_with(rpc_ok(json!({"ledger_index": 5_000})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "account_tx",
            "params": [{"ledger_index_min": -1, "ledger_index_max": -1, "limit": 1}]
        })))
        .respond_with(rpc_ok(json!({
            "transactions": [pft_payment("rA", 1_200, "genesis")]
        })))
        .mount(&server)
        .await;

    let range = validate_ledger_range(&client(&server), ISSUER, 0, Some(9_000))
        .await
        .unwrap();
    assert_eq!(range, (1_200, 5_000));
}
