//! Flat JSON artifacts (snapshots, checkpoints, analysis reports).

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to access artifact {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize artifact {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ArtifactError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write `value` as pretty JSON, replacing `path` atomically.
///
/// The payload goes to a sibling `.tmp` file first and is renamed over the
/// target, so readers never observe a half-written artifact.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ArtifactError::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| ArtifactError::io(&tmp_path, e))?;

    let result = write_and_rename(file, &tmp_path, path, value);
    if result.is_err() {
        // The target is untouched on failure; leave no stray temp file behind.
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_and_rename<T: Serialize + ?Sized>(
    file: fs::File,
    tmp_path: &Path,
    path: &Path,
    value: &T,
) -> Result<(), ArtifactError> {
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| ArtifactError::json(path, e))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| ArtifactError::io(tmp_path, e))?;
    drop(writer);

    fs::rename(tmp_path, path).map_err(|e| ArtifactError::io(path, e))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|e| ArtifactError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| ArtifactError::json(path, e))
}
