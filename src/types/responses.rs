//! Response types for searchduel.

use serde::{Deserialize, Serialize};

use super::requests::Provider;

/// Answer used when a provider replied successfully but without any text.
pub const NO_VALID_RESPONSE: &str = "No valid response received";

/// A source link attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    /// Source title (the URL itself when the provider gives none).
    pub title: String,

    /// Source URL.
    pub url: String,
}

impl Citation {
    /// Creates a new citation.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Normalized outcome of one query against one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// Provider that answered.
    pub provider: Provider,

    /// Original question.
    pub query: String,

    /// Model identifier that was requested.
    #[serde(default)]
    pub model: String,

    /// Answer text, empty when the call failed.
    #[serde(default)]
    pub answer: String,

    /// Sources in provider order.
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Wall-clock duration of the call; 0 when it failed or never started.
    #[serde(default)]
    pub elapsed_seconds: f64,

    /// Failure description, only present when the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Rendered search suggestion widget (Gemini grounding only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_entry_point: Option<String>,

    /// Follow-up questions suggested by the provider.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_questions: Vec<String>,

    /// Token usage, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl QueryResult {
    /// Creates a successful result.
    pub fn answered(
        provider: Provider,
        query: impl Into<String>,
        model: impl Into<String>,
        answer: impl Into<String>,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            provider,
            query: query.into(),
            model: model.into(),
            answer: answer.into(),
            citations: Vec::new(),
            elapsed_seconds: elapsed_seconds.max(0.0),
            error: None,
            search_entry_point: None,
            related_questions: Vec::new(),
            usage: None,
        }
    }

    /// Creates the recovered result for a reply that carried no text.
    pub fn no_valid_response(
        provider: Provider,
        query: impl Into<String>,
        model: impl Into<String>,
        elapsed_seconds: f64,
    ) -> Self {
        Self::answered(provider, query, model, NO_VALID_RESPONSE, elapsed_seconds)
    }

    /// Creates a failed result.
    pub fn failure(
        provider: Provider,
        query: impl Into<String>,
        model: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            query: query.into(),
            model: model.into(),
            answer: String::new(),
            citations: Vec::new(),
            elapsed_seconds: 0.0,
            error: Some(error.into()),
            search_entry_point: None,
            related_questions: Vec::new(),
            usage: None,
        }
    }

    /// Sets the citations.
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// Sets the search entry point markup.
    pub fn with_search_entry_point(mut self, markup: Option<String>) -> Self {
        self.search_entry_point = markup;
        self
    }

    /// Sets the related questions.
    pub fn with_related_questions(mut self, questions: Vec<String>) -> Self {
        self.related_questions = questions;
        self
    }

    /// Sets the token usage.
    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    /// Whether the call failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the provider replied without usable text.
    pub fn is_no_valid_response(&self) -> bool {
        self.error.is_none() && self.answer == NO_VALID_RESPONSE
    }

    /// Answer length in characters.
    pub fn answer_length(&self) -> usize {
        self.answer.chars().count()
    }
}

/// JSON object printed by the `search` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOutput {
    /// Answer text.
    pub answer: String,

    /// Sources.
    pub citations: Vec<Citation>,

    /// Always empty; kept for consumers that expect the field.
    pub images: Vec<String>,

    /// Rendered search widget, or null.
    pub search_entry_point: Option<String>,

    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutput {
    /// Output for a CLI invocation without a query.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            answer: String::new(),
            citations: Vec::new(),
            images: Vec::new(),
            search_entry_point: None,
            error: Some(message.into()),
        }
    }
}

impl From<QueryResult> for SearchOutput {
    fn from(result: QueryResult) -> Self {
        Self {
            answer: result.answer,
            citations: result.citations,
            images: Vec::new(),
            search_entry_point: result.search_entry_point,
            error: result.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_has_zero_elapsed_and_no_citations() {
        let result = QueryResult::failure(Provider::Gemini, "q", "gemini-2.0-flash", "boom");

        assert!(result.is_error());
        assert!(result.answer.is_empty());
        assert!(result.citations.is_empty());
        assert_eq!(result.elapsed_seconds, 0.0);
    }

    #[test]
    fn test_no_valid_response_is_not_an_error() {
        let result = QueryResult::no_valid_response(Provider::Perplexity, "q", "sonar", 0.4);

        assert!(!result.is_error());
        assert!(result.is_no_valid_response());
        assert_eq!(result.answer, NO_VALID_RESPONSE);
    }

    #[test]
    fn test_citations_always_serialized() {
        let result = QueryResult::answered(Provider::Gemini, "q", "m", "a", 1.0);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json["citations"].is_array());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_json_round_trip_is_field_for_field_equal() {
        let result = QueryResult::answered(Provider::Perplexity, "What is Rust?", "sonar", "A language.", 1.2345)
            .with_citations(vec![Citation::new("Rust", "https://www.rust-lang.org")])
            .with_related_questions(vec!["Who made Rust?".to_string()])
            .with_usage(Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }));

        let json = serde_json::to_string(&result).unwrap();
        let parsed: QueryResult = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, result);
    }

    #[test]
    fn test_search_output_keeps_null_entry_point() {
        let output = SearchOutput::from(QueryResult::answered(Provider::Gemini, "q", "m", "a", 0.1));
        let json = serde_json::to_value(&output).unwrap();

        assert!(json["search_entry_point"].is_null());
        assert_eq!(json["images"], serde_json::json!([]));
    }

    #[test]
    fn test_answer_length_counts_chars() {
        let result = QueryResult::answered(Provider::Gemini, "q", "m", "今天", 0.1);
        assert_eq!(result.answer_length(), 2);
    }
}
