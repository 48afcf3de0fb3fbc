//! Base trait for search executors.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::{Duration, Instant};

use super::citations::extract_markdown_citations;
use crate::types::requests::{Provider, QueryRequest};
use crate::types::responses::{Citation, QueryResult, TokenUsage};
use crate::{SearchDuelError, SearchDuelResult};

/// Instruction sent ahead of every query.
pub const ANSWER_INSTRUCTION: &str = "Please provide a concise answer to the question. \
Keep your answer brief and to the point. \
Add relevant source links at the end in a new line, formatted as [Source name](URL).";

/// Longest error body kept in an error record.
const MAX_ERROR_BODY: usize = 500;

/// Trait for executors that answer one query with one hosted provider.
///
/// Implementations only describe the HTTP exchange in [`execute`](Self::execute);
/// [`search`](Self::search) owns timing, normalization and error capture so
/// every provider returns the same [`QueryResult`] shape.
#[async_trait]
pub trait SearchExecutor: Send + Sync {
    /// Returns the executor name.
    fn name(&self) -> &str;

    /// Returns the provider this executor talks to.
    fn provider(&self) -> Provider;

    /// Model used when the request does not name one.
    fn default_model(&self) -> &str;

    /// Base URL of the provider API.
    fn endpoint(&self) -> &str;

    /// Performs the HTTP call and decodes the provider envelope.
    ///
    /// Any `Err` returned here ends up in [`QueryResult::error`].
    async fn execute(&self, request: &QueryRequest, model: &str) -> SearchDuelResult<ProviderReply>;

    /// Answers `request` and never fails: errors are captured into the result.
    async fn search(&self, request: &QueryRequest) -> QueryResult {
        let provider = self.provider();
        let model = request.model_or(self.default_model()).to_string();

        if request.query.trim().is_empty() {
            return QueryResult::failure(provider, &request.query, model, SearchDuelError::EmptyQuery.to_string());
        }

        tracing::debug!(provider = %provider, model = %model, "Sending query to {}", self.endpoint());

        let start = Instant::now();
        match self.execute(request, &model).await {
            Ok(reply) => {
                let elapsed = start.elapsed().as_secs_f64();
                let result = reply.into_result(provider, &request.query, model, elapsed);

                if result.is_no_valid_response() {
                    tracing::warn!(provider = %provider, "Provider returned no usable text");
                } else {
                    tracing::info!(
                        provider = %provider,
                        elapsed_seconds = elapsed,
                        citations = result.citations.len(),
                        "Query answered"
                    );
                }
                result
            }
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "Query failed");
                QueryResult::failure(provider, &request.query, model, e.to_string())
            }
        }
    }

    /// Builds a single-string prompt for providers without a system role.
    fn build_prompt(&self, query: &str) -> String {
        let mut prompt = String::from(ANSWER_INSTRUCTION);
        prompt.push_str("\n\nQuestion: ");
        prompt.push_str(query.trim());
        prompt
    }
}

/// What a provider returned, before normalization.
#[derive(Debug, Clone, Default)]
pub struct ProviderReply {
    /// Concatenated answer text, if any.
    pub answer: Option<String>,

    /// Structured citations; empty when the provider exposes none.
    pub citations: Vec<Citation>,

    pub search_entry_point: Option<String>,

    pub related_questions: Vec<String>,

    pub usage: Option<TokenUsage>,
}

impl ProviderReply {
    /// Normalizes the reply into a [`QueryResult`].
    ///
    /// Empty text yields the "no valid response" result. Without structured
    /// citations, links are scanned from the answer.
    pub fn into_result(
        self,
        provider: Provider,
        query: &str,
        model: String,
        elapsed_seconds: f64,
    ) -> QueryResult {
        let answer = match self.answer {
            Some(text) if !text.trim().is_empty() => text,
            _ => return QueryResult::no_valid_response(provider, query, model, elapsed_seconds),
        };

        let citations = if self.citations.is_empty() {
            extract_markdown_citations(&answer)
        } else {
            self.citations
        };

        QueryResult::answered(provider, query, model, answer, elapsed_seconds)
            .with_citations(citations)
            .with_search_entry_point(self.search_entry_point)
            .with_related_questions(self.related_questions)
            .with_usage(self.usage)
    }
}

/// Reads an explicit JSON `null` as the type's default.
///
/// Pair with `#[serde(default)]` so absent fields behave the same way.
pub(super) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Builds the HTTP client shared by every call of one executor.
pub fn http_client(timeout: Duration) -> SearchDuelResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("searchduel/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Turns a non-2xx response into [`SearchDuelError::Api`].
pub async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> SearchDuelResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
        body.push_str("...");
    }

    Err(SearchDuelError::Api {
        provider: provider.to_string(),
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}
