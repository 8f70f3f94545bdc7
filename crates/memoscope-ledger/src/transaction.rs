use memoscope_core::{Amount, MemoRecord, ledger_time_to_utc};
use serde::{Deserialize, Serialize};

pub const PAYMENT_TYPE: &str = "Payment";

/// The subset of a ledger transaction the ingestion pipeline reads.
///
/// Unknown fields are ignored. `hash` and `ledger_index` may be absent on
/// the inner object depending on API version; the RPC client fills them in
/// from the surrounding entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,

    #[serde(rename = "Account")]
    pub account: String,

    #[serde(rename = "Destination", default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(rename = "Amount", default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    /// API v2 renames `Amount` to `DeliverMax` on payments.
    #[serde(rename = "DeliverMax", default, skip_serializing_if = "Option::is_none")]
    pub deliver_max: Option<Amount>,

    #[serde(rename = "Memos", default, skip_serializing_if = "Vec::is_empty")]
    pub memos: Vec<MemoEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_index: Option<u32>,

    /// Close time in seconds since the ledger epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<u32>,
}

impl RawTransaction {
    pub fn payment_amount(&self) -> Option<&Amount> {
        self.amount.as_ref().or(self.deliver_max.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoEntry {
    #[serde(rename = "Memo", default)]
    pub memo: MemoFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoFields {
    #[serde(rename = "MemoData", default, skip_serializing_if = "Option::is_none")]
    pub memo_data: Option<String>,

    #[serde(rename = "MemoType", default, skip_serializing_if = "Option::is_none")]
    pub memo_type: Option<String>,

    #[serde(rename = "MemoFormat", default, skip_serializing_if = "Option::is_none")]
    pub memo_format: Option<String>,
}

/// A payment whose amount is the tracked issued currency.
///
/// Native amounts and other currencies are rejected. The issuer is not
/// compared: every transaction examined comes from the issuer's own history.
pub fn is_relevant_payment(tx: &RawTransaction, currency: &str) -> bool {
    tx.transaction_type == PAYMENT_TYPE
        && tx
            .payment_amount()
            .and_then(Amount::issued)
            .is_some_and(|amount| amount.currency == currency)
}

/// Raw memo payloads in transaction order. Entries without data are skipped.
pub fn extract_memos(tx: &RawTransaction) -> Vec<&str> {
    tx.memos
        .iter()
        .filter_map(|entry| entry.memo.memo_data.as_deref())
        .collect()
}

/// Build the record for one decoded memo. `None` when the transaction has no amount.
pub fn memo_record(tx: &RawTransaction, memo_text: String) -> Option<MemoRecord> {
    let amount = tx.payment_amount()?.clone();
    Some(MemoRecord {
        tx_hash: tx.hash.clone(),
        ledger_index: tx.ledger_index.unwrap_or_default(),
        timestamp: ledger_time_to_utc(tx.date.unwrap_or_default()),
        memo_text,
        sender: tx.account.clone(),
        destination: tx.destination.clone(),
        amount,
    })
}
