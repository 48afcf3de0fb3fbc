//! Provider comparison.
//!
//! Pure functions over already-computed [`QueryResult`]s: which provider was
//! faster, how many sources each cited, how long each answer was.
//!
//! ## Example
//!
//! ```rust,ignore
//! use searchduel::compare::{Comparator, ComparisonReport};
//!
//! let comparison = Comparator::compare(&gemini, &perplexity);
//! println!("{}", comparison.render());
//!
//! let report = ComparisonReport::new(vec![gemini, perplexity], comparison);
//! ```

mod comparator;

pub use comparator::{Comparator, Comparison};

use serde::{Deserialize, Serialize};

use crate::types::responses::QueryResult;

/// Everything the `compare` command writes to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub query: String,
    pub results: Vec<QueryResult>,
    pub comparison: Comparison,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ComparisonReport {
    /// Creates a report stamped with the current time.
    pub fn new(results: Vec<QueryResult>, comparison: Comparison) -> Self {
        Self {
            query: comparison.query.clone(),
            results,
            comparison,
            timestamp: chrono::Utc::now(),
        }
    }
}
