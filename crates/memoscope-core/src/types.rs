use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds between the Unix epoch and the ledger epoch (2000-01-01T00:00:00Z).
pub const LEDGER_EPOCH_OFFSET_SECS: i64 = 946_684_800;

/// Convert a ledger-relative timestamp (seconds since the ledger epoch) to UTC.
pub fn ledger_time_to_utc(ledger_seconds: u32) -> DateTime<Utc> {
    DateTime::from_timestamp(i64::from(ledger_seconds) + LEDGER_EPOCH_OFFSET_SECS, 0)
        .unwrap_or_default()
}

/// Inclusive range of ledger indices queried as one unit.
///
/// Windows produced for a walk are contiguous and never overlap, so the
/// half-open form `[start_index, end_index + 1)` is what gets displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerWindow {
    pub start_index: u32,
    pub end_index: u32,
}

impl LedgerWindow {
    /// Build a window from inclusive bounds. Returns `None` when `start > end`.
    pub fn new(start_index: u32, end_index: u32) -> Option<Self> {
        (start_index <= end_index).then_some(Self {
            start_index,
            end_index,
        })
    }

    /// Build a window covering `[start, end_exclusive)`. Returns `None` when empty.
    pub fn from_half_open(start: u32, end_exclusive: u32) -> Option<Self> {
        if end_exclusive <= start {
            return None;
        }
        Self::new(start, end_exclusive - 1)
    }

    /// One past the last ledger index in the window.
    pub fn end_exclusive(&self) -> u64 {
        u64::from(self.end_index) + 1
    }

    /// Number of ledgers covered.
    pub fn ledger_count(&self) -> u64 {
        self.end_exclusive() - u64::from(self.start_index)
    }

    pub fn contains(&self, ledger_index: u32) -> bool {
        (self.start_index..=self.end_index).contains(&ledger_index)
    }
}

impl fmt::Display for LedgerWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_index, self.end_exclusive())
    }
}

/// Non-native currency amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedAmount {
    pub currency: String,
    pub issuer: String,
    pub value: String,
}

/// Payment amount as reported by the ledger.
///
/// Native amounts are a bare string of drops; issued amounts are objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Issued(IssuedAmount),
    Native(String),
}

impl Amount {
    pub fn issued(&self) -> Option<&IssuedAmount> {
        match self {
            Self::Issued(amount) => Some(amount),
            Self::Native(_) => None,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }
}

/// A successfully decoded memo together with its transaction metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoRecord {
    pub tx_hash: Option<String>,
    pub ledger_index: u32,
    pub timestamp: DateTime<Utc>,
    /// Decoded memo text. Older snapshots used the `memo_data` key.
    #[serde(alias = "memo_data")]
    pub memo_text: String,
    pub sender: String,
    pub destination: Option<String>,
    pub amount: Amount,
}

/// Memo records keyed by sending account, each list in ledger arrival order.
pub type UserMemoIndex = BTreeMap<String, Vec<MemoRecord>>;

/// Per-account output of the credibility stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityAssessment {
    pub score: u8,
    pub explanation: String,
    pub memo_count: usize,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
}

impl CredibilityAssessment {
    /// Whole days between the first and last memo.
    pub fn timespan_days(&self) -> i64 {
        (self.last_timestamp - self.first_timestamp).num_days()
    }
}
