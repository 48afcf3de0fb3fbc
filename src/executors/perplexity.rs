//! Executor for the Perplexity chat-completions API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::base::{
    ensure_success, http_client, null_as_default, ProviderReply, SearchExecutor, ANSWER_INSTRUCTION,
};
use crate::types::config::ProviderConfig;
use crate::types::requests::{Provider, QueryRequest};
use crate::types::responses::{Citation, TokenUsage};
use crate::SearchDuelResult;

/// Executor for Perplexity online models.
///
/// Uses the OpenAI-compatible `/chat/completions` endpoint with the
/// instruction as the system message.
pub struct PerplexityExecutor {
    client: reqwest::Client,
    api_key: String,
    config: ProviderConfig,
}

impl PerplexityExecutor {
    /// Creates a Perplexity executor with default settings.
    pub fn new(api_key: impl Into<String>) -> SearchDuelResult<Self> {
        Self::from_config(&ProviderConfig::perplexity(), api_key, Duration::from_secs(30))
    }

    /// Creates an executor from the TOML configuration.
    pub fn from_config(
        config: &ProviderConfig,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> SearchDuelResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            config: config.clone(),
        })
    }

    /// Points the executor at another host (proxies, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body<'a>(&'a self, query: &'a str, model: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ANSWER_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: query.trim(),
                },
            ],
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            top_k: self.config.top_k,
            stream: false,
            presence_penalty: 0.0,
            frequency_penalty: 1.0,
            return_images: false,
            return_related_questions: true,
            search_recency_filter: self.config.search_recency_filter.as_deref(),
            search_domain_filter: &self.config.search_domain_filter,
            web_search_options: WebSearchOptions {
                search_context_size: &self.config.search_context_size,
            },
        }
    }
}

#[async_trait]
impl SearchExecutor for PerplexityExecutor {
    fn name(&self) -> &str {
        "Perplexity"
    }

    fn provider(&self) -> Provider {
        Provider::Perplexity
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }

    async fn execute(&self, request: &QueryRequest, model: &str) -> SearchDuelResult<ProviderReply> {
        let body = self.build_body(&request.query, model);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(self.name(), response).await?;
        let envelope: ChatCompletionResponse = response.json().await?;

        Ok(envelope.into_reply())
    }
}

// Request envelope

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    stream: bool,
    presence_penalty: f64,
    frequency_penalty: f64,
    return_images: bool,
    return_related_questions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_recency_filter: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    search_domain_filter: &'a [String],
    web_search_options: WebSearchOptions<'a>,
}

fn is_empty_slice(values: &&[String]) -> bool {
    values.is_empty()
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct WebSearchOptions<'a> {
    search_context_size: &'a str,
}

// Response envelope. Citations have moved around between API revisions:
// `search_results` objects, per-message citation objects, and a top-level
// list of bare URLs are all accepted.

#[derive(Debug, Default, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    choices: Vec<Choice>,
    #[serde(default, deserialize_with = "null_as_default")]
    search_results: Vec<SearchResultEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    citations: Vec<CitationEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    related_questions: Vec<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Default, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    citations: Vec<CitationEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResultEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CitationEntry {
    Url(String),
    Linked {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
}

impl CitationEntry {
    fn into_citation(self) -> Option<Citation> {
        let (url, title) = match self {
            CitationEntry::Url(url) => (url, None),
            CitationEntry::Linked { url, title } => (url?, title),
        };
        if url.trim().is_empty() {
            return None;
        }
        let title = title.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| url.clone());
        Some(Citation::new(title, url))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default, deserialize_with = "null_as_default")]
    prompt_tokens: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    completion_tokens: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    total_tokens: u32,
}

impl ChatCompletionResponse {
    fn into_reply(self) -> ProviderReply {
        let (answer, message_citations) = match self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
        {
            Some(message) => (message.content, message.citations),
            None => (None, Vec::new()),
        };

        let mut citations: Vec<Citation> = self
            .search_results
            .into_iter()
            .filter_map(|entry| {
                CitationEntry::Linked {
                    url: entry.url,
                    title: entry.title,
                }
                .into_citation()
            })
            .collect();

        if citations.is_empty() {
            citations = message_citations
                .into_iter()
                .filter_map(CitationEntry::into_citation)
                .collect();
        }

        if citations.is_empty() {
            citations = self
                .citations
                .into_iter()
                .filter_map(CitationEntry::into_citation)
                .collect();
        }

        ProviderReply {
            answer,
            citations,
            search_entry_point: None,
            related_questions: self.related_questions,
            usage: self.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ProviderReply {
        serde_json::from_str::<ChatCompletionResponse>(json)
            .unwrap()
            .into_reply()
    }

    #[test]
    fn test_search_results_take_precedence() {
        let reply = parse(
            r#"{
                "choices": [{"message": {"role": "assistant", "content": "Answer [1]."}}],
                "citations": ["https://bare.example"],
                "search_results": [{"title": "Titled", "url": "https://titled.example", "date": null}]
            }"#,
        );

        assert_eq!(reply.answer.as_deref(), Some("Answer [1]."));
        assert_eq!(reply.citations, vec![Citation::new("Titled", "https://titled.example")]);
    }

    #[test]
    fn test_message_citations() {
        let reply = parse(
            r#"{"choices": [{"message": {"content": "A", "citations": [
                {"url": "https://one.example", "title": "One"},
                {"url": "https://two.example"}
            ]}}]}"#,
        );

        assert_eq!(
            reply.citations,
            vec![
                Citation::new("One", "https://one.example"),
                Citation::new("https://two.example", "https://two.example"),
            ]
        );
    }

    #[test]
    fn test_bare_url_citations() {
        let reply = parse(
            r#"{
                "choices": [{"message": {"content": "A"}}],
                "citations": ["https://x.example", "https://y.example"],
                "related_questions": ["What next?"],
                "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
            }"#,
        );

        assert_eq!(reply.citations.len(), 2);
        assert_eq!(reply.citations[0].title, "https://x.example");
        assert_eq!(reply.related_questions, vec!["What next?".to_string()]);
        assert_eq!(reply.usage.map(|u| u.completion_tokens), Some(7));
    }

    #[test]
    fn test_no_choices() {
        let reply = parse(r#"{"id": "abc", "choices": []}"#);
        assert!(reply.answer.is_none());
        assert!(reply.citations.is_empty());
    }

    #[test]
    fn test_null_lists_are_tolerated() {
        let reply = parse(
            r#"{
                "choices": [{"message": {"content": "A [x](https://x.example)", "citations": null}}],
                "citations": null,
                "search_results": null,
                "related_questions": null,
                "usage": {"prompt_tokens": null, "completion_tokens": 3, "total_tokens": 3}
            }"#,
        );

        assert_eq!(reply.answer.as_deref(), Some("A [x](https://x.example)"));
        assert!(reply.citations.is_empty());
        assert!(reply.related_questions.is_empty());
        assert_eq!(reply.usage.map(|u| u.prompt_tokens), Some(0));
    }

    #[test]
    fn test_null_choices() {
        let reply = parse(r#"{"choices": null}"#);
        assert!(reply.answer.is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let executor = PerplexityExecutor::new("key").unwrap();
        let body = serde_json::to_value(executor.build_body(" nvidia stock price? ", "sonar")).unwrap();

        assert_eq!(body["model"], "sonar");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "nvidia stock price?");
        assert_eq!(body["stream"], false);
        assert_eq!(body["frequency_penalty"], 1.0);
        assert_eq!(body["search_recency_filter"], "day");
        assert_eq!(body["web_search_options"]["search_context_size"], "high");
        assert!(body.get("search_domain_filter").is_none());
    }
}
