//! In-memory ledger for exercising pagination, windowing and failures.

use std::sync::Mutex;

use async_trait::async_trait;
use memoscope_core::{Amount, IssuedAmount};
use serde_json::{Value, json};

use crate::memo::encode_memo;
use crate::service::{AccountTxPage, AccountTxRequest, LedgerError, LedgerService, PaginationCursor};
use crate::transaction::{MemoEntry, MemoFields, PAYMENT_TYPE, RawTransaction};

pub(crate) const ISSUER: &str = "rIssuer1";

/// Serves a fixed, ledger-ordered transaction list. Cursors are offsets
/// into the window's matches; call numbers count `account_tx` requests.
pub(crate) struct ScriptedLedger {
    transactions: Vec<RawTransaction>,
    current_ledger: u32,
    fail_on_call: Option<usize>,
    fail_current_ledger: bool,
    requests: Mutex<Vec<AccountTxRequest>>,
}

impl ScriptedLedger {
    pub(crate) fn new(transactions: Vec<RawTransaction>) -> Self {
        Self {
            transactions,
            current_ledger: u32::MAX,
            fail_on_call: None,
            fail_current_ledger: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_current_ledger(mut self, index: u32) -> Self {
        self.current_ledger = index;
        self
    }

    /// Fail the `call`-th `account_tx` request (1-based).
    pub(crate) fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub(crate) fn fail_current_ledger(mut self) -> Self {
        self.fail_current_ledger = true;
        self
    }

    pub(crate) fn requests(&self) -> Vec<AccountTxRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerService for ScriptedLedger {
    async fn current_ledger_index(&self) -> Result<u32, LedgerError> {
        if self.fail_current_ledger {
            return Err(unavailable());
        }
        Ok(self.current_ledger)
    }

    async fn account_transactions(
        &self,
        request: &AccountTxRequest,
    ) -> Result<AccountTxPage, LedgerError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(unavailable());
        }

        let min = u32::try_from(request.ledger_index_min).unwrap_or(0);
        let max = u32::try_from(request.ledger_index_max).unwrap_or(u32::MAX);
        let matching: Vec<&RawTransaction> = self
            .transactions
            .iter()
            .filter(|tx| {
                let index = tx.ledger_index.unwrap_or_default();
                (min..=max).contains(&index)
            })
            .collect();

        let offset = request
            .cursor
            .as_ref()
            .and_then(|cursor| cursor.0.get("offset"))
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let limit = request.limit as usize;
        let transactions = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|tx| (*tx).clone())
            .collect();
        let next_cursor = (offset + limit < matching.len())
            .then(|| PaginationCursor(json!({ "offset": offset + limit })));

        Ok(AccountTxPage {
            transactions,
            next_cursor,
        })
    }
}

fn unavailable() -> LedgerError {
    LedgerError::Http {
        status: 503,
        body: "node overloaded".to_string(),
    }
}

/// Payment to the issuer carrying `memo` encoded as hex.
pub(crate) fn issued_payment(sender: &str, ledger_index: u32, currency: &str, memo: &str) -> RawTransaction {
    payment_with_raw_memos(
        sender,
        ledger_index,
        Amount::Issued(IssuedAmount {
            currency: currency.to_string(),
            issuer: ISSUER.to_string(),
            value: "1".to_string(),
        }),
        &[&encode_memo(memo)],
    )
}

pub(crate) fn native_payment(sender: &str, ledger_index: u32, memo: &str) -> RawTransaction {
    payment_with_raw_memos(
        sender,
        ledger_index,
        Amount::Native("1000000".to_string()),
        &[&encode_memo(memo)],
    )
}

pub(crate) fn payment_with_raw_memos(
    sender: &str,
    ledger_index: u32,
    amount: Amount,
    raw_memos: &[&str],
) -> RawTransaction {
    RawTransaction {
        transaction_type: PAYMENT_TYPE.to_string(),
        account: sender.to_string(),
        destination: Some(ISSUER.to_string()),
        amount: Some(amount),
        deliver_max: None,
        memos: raw_memos
            .iter()
            .map(|data| MemoEntry {
                memo: MemoFields {
                    memo_data: Some((*data).to_string()),
                    ..MemoFields::default()
                },
            })
            .collect(),
        hash: Some(format!("TX{ledger_index}{sender}")),
        ledger_index: Some(ledger_index),
        date: Some(ledger_index.saturating_mul(4)),
    }
}
