use std::path::Path;

use memoscope_core::{ArtifactError, UserMemoIndex, read_json, write_json_atomic};

/// Persist a completed index as pretty JSON.
pub fn save_snapshot(path: &Path, index: &UserMemoIndex) -> Result<(), ArtifactError> {
    write_json_atomic(path, index)?;
    tracing::info!(
        path = %path.display(),
        accounts = index.len(),
        "saved memo snapshot"
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<UserMemoIndex, ArtifactError> {
    read_json(path)
}
