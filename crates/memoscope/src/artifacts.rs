//! Default artifact names and snapshot discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `<prefix>[_<qualifier>]_<YYYYmmdd_HHMMSS>.json`.
pub(crate) fn artifact_file_name(prefix: &str, qualifier: Option<&str>, at: NaiveDateTime) -> String {
    let stamp = at.format(TIMESTAMP_FORMAT);
    match qualifier {
        Some(qualifier) => format!("{prefix}_{}_{stamp}.json", sanitize(qualifier)),
        None => format!("{prefix}_{stamp}.json"),
    }
}

/// Keep a user-supplied name component to one path segment.
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Newest `<prefix>_*.json` snapshot in `dir`, by file name.
///
/// Timestamps sort lexicographically, so the greatest name is the newest.
/// Checkpoints (`<prefix>_error_*`) are never picked.
pub(crate) fn latest_snapshot(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to list {}", dir.display()));
        }
    };

    let stem_prefix = format!("{prefix}_");
    let mut newest: Option<String> = None;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(rest) = name.strip_prefix(&stem_prefix) else {
            continue;
        };
        if !rest.ends_with(".json") || rest.starts_with("error_") {
            continue;
        }
        if newest.as_deref().is_none_or(|current| name.as_str() > current) {
            newest = Some(name);
        }
    }
    Ok(newest.map(|name| dir.join(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 3)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_artifact_file_names() {
        assert_eq!(
            artifact_file_name("pft_memos", None, at()),
            "pft_memos_20241003_140509.json"
        );
        assert_eq!(
            artifact_file_name("credibility_analysis", Some("NVDA"), at()),
            "credibility_analysis_NVDA_20241003_140509.json"
        );
        assert_eq!(
            artifact_file_name("report", Some("a/b c"), at()),
            "report_a_b_c_20241003_140509.json"
        );
    }

    #[test]
    fn test_latest_snapshot_picks_newest_name() {
        let dir = tempdir().unwrap();
        for name in [
            "pft_memos_20240101_000000.json",
            "pft_memos_20241003_140509.json",
            "pft_memos_error_99999999.json",
            "pft_memos_20250101_000000.txt",
            "other_20991231_000000.json",
        ] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let latest = latest_snapshot(dir.path(), "pft_memos").unwrap();
        assert_eq!(
            latest,
            Some(dir.path().join("pft_memos_20241003_140509.json"))
        );
    }

    #[test]
    fn test_latest_snapshot_missing_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(
            latest_snapshot(&dir.path().join("absent"), "pft_memos").unwrap(),
            None
        );
        assert_eq!(latest_snapshot(dir.path(), "pft_memos").unwrap(), None);
    }
}
