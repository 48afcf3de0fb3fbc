//! Executor for the Gemini `generateContent` API with Google Search grounding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::base::{ensure_success, http_client, null_as_default, ProviderReply, SearchExecutor};
use crate::types::config::ProviderConfig;
use crate::types::requests::{Provider, QueryRequest};
use crate::types::responses::{Citation, TokenUsage};
use crate::SearchDuelResult;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Executor for Google Gemini.
///
/// Sends the instruction and the query as a single user turn and, unless
/// grounding is disabled, attaches the `google_search` tool so the answer is
/// backed by web results.
pub struct GeminiExecutor {
    client: reqwest::Client,
    api_key: String,
    config: ProviderConfig,
}

impl GeminiExecutor {
    /// Creates a Gemini executor with default settings.
    pub fn new(api_key: impl Into<String>) -> SearchDuelResult<Self> {
        Self::from_config(&ProviderConfig::gemini(), api_key, Duration::from_secs(30))
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

    fn url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    fn build_body(&self, query: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: self.build_prompt(query),
                }],
            }],
            tools: if self.config.grounding {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            } else {
                Vec::new()
            },
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        }
    }
}

#[async_trait]
impl SearchExecutor for GeminiExecutor {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }

    async fn execute(&self, request: &QueryRequest, model: &str) -> SearchDuelResult<ProviderReply> {
        let body = self.build_body(&request.query);

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(self.name(), response).await?;
        let envelope: GenerateContentResponse = response.json().await?;

        Ok(envelope.into_reply())
    }
}

// Request envelope

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

// Response envelope. Every field is optional: the API omits substructures
// freely (no grounding, blocked prompts, empty candidates).

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default, deserialize_with = "null_as_default")]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    grounding_chunks: Vec<GroundingChunk>,
    #[serde(default)]
    search_entry_point: Option<SearchEntryPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    web_search_queries: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntryPoint {
    #[serde(default)]
    rendered_content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    prompt_token_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    candidates_token_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    total_token_count: u32,
}

impl GenerateContentResponse {
    fn into_reply(self) -> ProviderReply {
        let usage = self.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        let Some(candidate) = self.candidates.into_iter().next() else {
            return ProviderReply {
                usage,
                ..Default::default()
            };
        };

        let answer = candidate.content.map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        });

        let mut reply = ProviderReply {
            answer,
            usage,
            ..Default::default()
        };

        if let Some(grounding) = candidate.grounding_metadata {
            if !grounding.web_search_queries.is_empty() {
                tracing::debug!(queries = ?grounding.web_search_queries, "Gemini grounding searches");
            }

            reply.citations = grounding
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| {
                    let url = web.uri?;
                    let title = web.title.unwrap_or_else(|| url.clone());
                    Some(Citation::new(title, url))
                })
                .collect();

            reply.search_entry_point = grounding
                .search_entry_point
                .and_then(|entry| entry.rendered_content);
        }

        reply
    }
}
