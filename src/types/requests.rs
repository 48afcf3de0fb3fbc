//! Request types for searchduel.

use serde::{Deserialize, Serialize};

use crate::SearchDuelError;

/// Hosted search-grounded AI provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Google Gemini with the Google Search grounding tool.
    Gemini,
    /// Perplexity chat completions (online models).
    Perplexity,
}

impl Provider {
    /// All known providers, in the order comparisons run them.
    pub const ALL: [Provider; 2] = [Provider::Gemini, Provider::Perplexity];

    /// Model used when the caller does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Perplexity => "sonar",
        }
    }

    /// Human-readable name used in logs and reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Perplexity => "Perplexity",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::Perplexity => write!(f, "perplexity"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = SearchDuelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "perplexity" | "pplx" => Ok(Provider::Perplexity),
            other => Err(SearchDuelError::UnknownProvider(other.to_string())),
        }
    }
}

/// A single question addressed to one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question as typed by the user.
    pub query: String,

    /// Model identifier; `None` means the executor's default.
    pub model: Option<String>,
}

impl QueryRequest {
    /// Creates a request using the executor's default model.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            model: None,
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Resolves the model, falling back to `default`.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str_is_case_insensitive() {
        assert_eq!("Gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!(" PERPLEXITY ".parse::<Provider>().unwrap(), Provider::Perplexity);
        assert!("openai".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_serializes_lowercase() {
        let json = serde_json::to_string(&Provider::Perplexity).unwrap();
        assert_eq!(json, "\"perplexity\"");
    }

    #[test]
    fn test_model_or_falls_back_on_blank() {
        let request = QueryRequest::new("q").with_model("  ");
        assert_eq!(request.model_or("sonar"), "sonar");

        let request = QueryRequest::new("q").with_model("sonar-pro");
        assert_eq!(request.model_or("sonar"), "sonar-pro");
    }
}
