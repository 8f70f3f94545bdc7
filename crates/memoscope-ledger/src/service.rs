use async_trait::async_trait;
use memoscope_core::LedgerWindow;
use serde::{Deserialize, Serialize};

use crate::transaction::RawTransaction;

/// Opaque continuation token returned by the ledger node.
///
/// Only ever passed back to the node that issued it, and only within the
/// window it was issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaginationCursor(pub serde_json::Value);

/// Parameters of one `account_tx` page request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountTxRequest {
    pub account: String,
    /// Inclusive lower bound; `-1` means the earliest available ledger.
    pub ledger_index_min: i64,
    /// Inclusive upper bound; `-1` means the latest validated ledger.
    pub ledger_index_max: i64,
    pub forward: bool,
    pub limit: u32,
    #[serde(rename = "marker", skip_serializing_if = "Option::is_none")]
    pub cursor: Option<PaginationCursor>,
}

impl AccountTxRequest {
    /// Oldest-first request covering exactly `window`.
    pub fn for_window(account: &str, window: LedgerWindow, limit: u32) -> Self {
        Self {
            account: account.to_string(),
            ledger_index_min: i64::from(window.start_index),
            ledger_index_max: i64::from(window.end_index),
            forward: true,
            limit,
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<PaginationCursor>) -> Self {
        self.cursor = cursor;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountTxPage {
    pub transactions: Vec<RawTransaction>,
    pub next_cursor: Option<PaginationCursor>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("ledger request failed")]
    Transport(#[source] reqwest::Error),

    #[error("ledger node returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("ledger node rejected {method}: {code}: {message}")]
    Rpc {
        method: String,
        code: String,
        message: String,
    },

    #[error("malformed {method} response: {reason}")]
    MalformedResponse { method: String, reason: String },
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// Read access to a ledger node.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Index of the most recent validated ledger.
    async fn current_ledger_index(&self) -> Result<u32, LedgerError>;

    /// One page of an account's transaction history.
    async fn account_transactions(
        &self,
        request: &AccountTxRequest,
    ) -> Result<AccountTxPage, LedgerError>;
}
