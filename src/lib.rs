//! # searchduel
//!
//! Asks two hosted, search-grounded AI services the same question and
//! compares what comes back.
//!
//! Every call goes through a [`SearchExecutor`](executors::SearchExecutor)
//! and ends as a [`QueryResult`](types::responses::QueryResult): answer text,
//! ordered citations, elapsed time, or an error description. Executors never
//! return errors to their callers.
//!
//! ## Modules
//!
//! - [`executors`] - Gemini and Perplexity executors
//! - [`compare`] - Side-by-side comparison of two results
//! - [`batch`] - Sequential batch driver and JSON reports
//! - [`cli`] - Command-line interface
//! - [`types`] - Shared types

pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compare;
pub mod executors;
pub mod types;

pub use types::config::Config;
pub use types::errors::{SearchDuelError, SearchDuelResult};
