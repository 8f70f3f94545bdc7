use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use memoscope_core::{ArtifactError, UserMemoIndex, read_json, write_json_atomic};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Partial results persisted when a walk aborts.
///
/// `user_memos` holds exactly the records of fully processed windows, so a
/// walk restarted at `failed_window_start` produces no duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub failed_window_start: u32,
    /// End ledger (exclusive) the aborted walk was asked for; `None` meant
    /// "up to the current ledger".
    #[serde(default)]
    pub requested_end: Option<u32>,
    pub currency: String,
    pub issuer: String,
    pub created_at: DateTime<Utc>,
    pub user_memos: UserMemoIndex,
}

/// Invoked once when ingestion hits an unrecoverable error.
pub trait RecoveryHandler: Send + Sync {
    /// Persist `snapshot` and return where it went.
    fn on_fatal_error(
        &self,
        snapshot: UserMemoIndex,
        failing_window_start: u32,
        requested_end: Option<u32>,
    ) -> Result<PathBuf, ArtifactError>;
}

/// Writes `<dir>/<prefix>_error_<failing_window_start>.json`.
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    dir: PathBuf,
    prefix: String,
    currency: String,
    issuer: String,
}

impl CheckpointWriter {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        currency: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            currency: currency.into(),
            issuer: issuer.into(),
        }
    }

    pub fn path_for(&self, failing_window_start: u32) -> PathBuf {
        self.dir
            .join(format!("{}_error_{failing_window_start}.json", self.prefix))
    }
}

impl RecoveryHandler for CheckpointWriter {
    fn on_fatal_error(
        &self,
        snapshot: UserMemoIndex,
        failing_window_start: u32,
        requested_end: Option<u32>,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.path_for(failing_window_start);
        let checkpoint = Checkpoint {
            failed_window_start: failing_window_start,
            requested_end,
            currency: self.currency.clone(),
            issuer: self.issuer.clone(),
            created_at: Utc::now(),
            user_memos: snapshot,
        };
        write_json_atomic(&path, &checkpoint)?;
        warn!(
            path = %path.display(),
            failed_window_start = failing_window_start,
            accounts = checkpoint.user_memos.len(),
            "wrote ingestion checkpoint"
        );
        Ok(path)
    }
}

pub fn load_checkpoint(path: &Path) -> Result<Checkpoint, ArtifactError> {
    read_json(path)
}
