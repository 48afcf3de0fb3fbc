//! Error types for searchduel.

use thiserror::Error;

/// Default result type for searchduel.
pub type SearchDuelResult<T> = Result<T, SearchDuelError>;

/// Errors that can occur in searchduel.
///
/// Executors never hand these to their callers: the `search` boundary turns
/// them into a [`QueryResult`](crate::types::responses::QueryResult) with the
/// `error` field set.
#[derive(Error, Debug)]
pub enum SearchDuelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error: {status} {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("No API key found for {provider} (checked: {checked})")]
    MissingApiKey { provider: String, checked: String },

    #[error("Unknown provider: '{0}'")]
    UnknownProvider(String),

    #[error("No query provided")]
    EmptyQuery,
}

impl SearchDuelError {
    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
