//! Timestamped JSON reports.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::SearchDuelResult;

/// Writes `value` as pretty JSON to `{dir}/{prefix}_{YYYYmmdd_HHMMSS}.json`.
///
/// Creates `dir` when missing. A numeric suffix is added if a report with the
/// same timestamp already exists. Returns the path written.
pub fn write_report<T: Serialize>(value: &T, dir: &Path, prefix: &str) -> SearchDuelResult<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        tracing::debug!("Directory created: {}", dir.display());
    }

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut path = dir.join(format!("{prefix}_{stamp}.json"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{prefix}_{stamp}_{n}.json"));
        n += 1;
    }

    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, content)?;

    tracing::info!("Report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_report_creates_dir_and_unique_names() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("reports");
        let value = serde_json::json!({"query": "q"});

        let first = write_report(&value, &dir, "comparison_results").unwrap();
        let second = write_report(&value, &dir, "comparison_results").unwrap();

        assert_ne!(first, second);
        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("comparison_results_"));
        assert!(name.ends_with(".json"));

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&first).unwrap()).unwrap();
        assert_eq!(parsed["query"], "q");
    }
}
