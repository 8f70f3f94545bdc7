use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::service::{AccountTxPage, AccountTxRequest, LedgerError, LedgerService, PaginationCursor};
use crate::transaction::RawTransaction;

const MAX_ERROR_BODY: usize = 512;

/// [`LedgerService`] over a node's JSON-RPC HTTP endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcLedgerClient {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcLedgerClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LedgerError::Transport)?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC call and return its `result` object.
    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        debug!(method, url = %self.url, "ledger rpc request");
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "method": method, "params": [params] }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LedgerError::Http {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let mut envelope: Value =
            serde_json::from_str(&body).map_err(|e| malformed(method, e.to_string()))?;
        let result = envelope
            .get_mut("result")
            .map(Value::take)
            .ok_or_else(|| malformed(method, "missing `result`"))?;

        if let Some(code) = result.get("error").and_then(Value::as_str) {
            let message = result
                .get("error_message")
                .or_else(|| result.get("error_exception"))
                .and_then(Value::as_str)
                .unwrap_or(code);
            return Err(LedgerError::Rpc {
                method: method.to_string(),
                code: code.to_string(),
                message: message.to_string(),
            });
        }
        Ok(result)
    }
}

#[async_trait]
impl LedgerService for JsonRpcLedgerClient {
    async fn current_ledger_index(&self) -> Result<u32, LedgerError> {
        #[derive(Deserialize)]
        struct LedgerResult {
            ledger_index: u32,
        }

        let result = self
            .call("ledger", json!({ "ledger_index": "validated" }))
            .await?;
        let parsed: LedgerResult =
            serde_json::from_value(result).map_err(|e| malformed("ledger", e.to_string()))?;
        Ok(parsed.ledger_index)
    }

    async fn account_transactions(
        &self,
        request: &AccountTxRequest,
    ) -> Result<AccountTxPage, LedgerError> {
        let params = serde_json::to_value(request)
            .map_err(|e| malformed("account_tx", e.to_string()))?;
        let result = self.call("account_tx", params).await?;
        parse_account_tx(result)
    }
}

#[derive(Deserialize)]
struct AccountTxResult {
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default)]
    marker: Option<PaginationCursor>,
}

/// One history entry. API v1 nests the transaction under `tx`, v2 under
/// `tx_json` with `hash` and `ledger_index` moved to the entry itself.
#[derive(Deserialize)]
struct AccountTxEntry {
    #[serde(default, alias = "tx_json")]
    tx: Option<RawTransaction>,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    ledger_index: Option<u32>,
}

fn parse_account_tx(result: Value) -> Result<AccountTxPage, LedgerError> {
    let parsed: AccountTxResult =
        serde_json::from_value(result).map_err(|e| malformed("account_tx", e.to_string()))?;

    let mut transactions = Vec::with_capacity(parsed.transactions.len());
    for (position, entry) in parsed.transactions.into_iter().enumerate() {
        let entry: AccountTxEntry = match serde_json::from_value(entry) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(position, error = %err, "skipping unparseable account_tx entry");
                continue;
            }
        };
        let Some(mut tx) = entry.tx else {
            debug!(position, "account_tx entry without transaction body");
            continue;
        };
        if tx.hash.is_none() {
            tx.hash = entry.hash;
        }
        if tx.ledger_index.is_none() {
            tx.ledger_index = entry.ledger_index;
        }
        transactions.push(tx);
    }

    Ok(AccountTxPage {
        transactions,
        next_cursor: parsed.marker,
    })
}

fn malformed(method: &str, reason: impl Into<String>) -> LedgerError {
    LedgerError::MalformedResponse {
        method: method.to_string(),
        reason: reason.into(),
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
