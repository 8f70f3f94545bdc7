//! Shared data model, error taxonomy and JSON artifact helpers for memoscope.

pub mod artifact;
pub mod error;
pub mod types;

pub use artifact::{ArtifactError, read_json, write_json_atomic};
pub use error::{AppError, BoxError};
pub use types::{
    Amount, CredibilityAssessment, IssuedAmount, LEDGER_EPOCH_OFFSET_SECS, LedgerWindow,
    MemoRecord, UserMemoIndex, ledger_time_to_utc,
};
