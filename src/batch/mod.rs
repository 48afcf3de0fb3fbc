//! Batch driver.
//!
//! Loops over a list of queries, calls each provider (and optionally each
//! model) sequentially with a fixed pause in between to stay under provider
//! throttling, and collects everything into a [`BatchReport`] that can be
//! written with [`write_report`].

mod report;
mod runner;

pub use report::write_report;
pub use runner::BatchRunner;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::compare::Comparison;
use crate::types::responses::QueryResult;
use crate::SearchDuelResult;

/// Results of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: uuid::Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub delay_ms: u64,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    fn start(delay: Duration) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            finished_at: None,
            delay_ms: delay.as_millis() as u64,
            entries: Vec::new(),
        }
    }

    fn finish(&mut self) {
        self.finished_at = Some(chrono::Utc::now());
    }

    /// Number of failed calls across the run.
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| e.results.iter())
            .filter(|r| r.is_error())
            .count()
    }
}

/// Results for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub query: String,
    pub results: Vec<QueryResult>,

    /// Present when exactly two different providers answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
}

/// Reads queries from a file: one per line, blank lines and `#` comments skipped.
pub fn load_queries(path: &Path) -> SearchDuelResult<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_queries(&content))
}

fn parse_queries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queries_skips_comments_and_blanks() {
        let queries = parse_queries("# news\nWhat happened today?\n\n  NVIDIA price?  \n#end\n");

        assert_eq!(queries, vec!["What happened today?", "NVIDIA price?"]);
    }
}
