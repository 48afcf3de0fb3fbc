//! Configuration for searchduel.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::requests::Provider;
use crate::{SearchDuelError, SearchDuelResult};

/// Main configuration for searchduel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Provider settings.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Credential settings.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Batch driver settings.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// HTTP timeout for providers that do not set their own (in seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Per-provider settings.
///
/// Each `[providers.<name>]` table overrides that provider's defaults key by
/// key, so a section may set a single field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ProvidersOverrides")]
pub struct ProvidersConfig {
    /// Gemini configuration.
    pub gemini: ProviderConfig,

    /// Perplexity configuration.
    pub perplexity: ProviderConfig,
}

impl ProvidersConfig {
    /// Returns the configuration for `provider`.
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::Perplexity => &self.perplexity,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            gemini: ProviderConfig::gemini(),
            perplexity: ProviderConfig::perplexity(),
        }
    }
}

impl From<ProvidersOverrides> for ProvidersConfig {
    fn from(overrides: ProvidersOverrides) -> Self {
        Self {
            gemini: overrides.gemini.apply(ProviderConfig::gemini()),
            perplexity: overrides.perplexity.apply(ProviderConfig::perplexity()),
        }
    }
}

/// Configuration for a specific provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfig {
    /// Enabled.
    pub enabled: bool,

    /// API base URL, without a trailing slash.
    pub base_url: String,

    /// Model used when none is given.
    pub default_model: String,

    /// Models swept by `batch`; empty means `default_model` only.
    pub models: Vec<String>,

    /// Environment variables checked for the API key, in order.
    pub api_key_env: Vec<String>,

    /// HTTP timeout (in seconds); falls back to `general.timeout_secs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Sampling temperature.
    pub temperature: f64,

    /// Nucleus sampling.
    pub top_p: f64,

    /// Top-k sampling.
    pub top_k: u32,

    /// Output token cap.
    pub max_output_tokens: u32,

    /// Attach the Google Search tool (Gemini only).
    pub grounding: bool,

    /// Restrict results by age: "day", "week", "month" (Perplexity only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<String>,

    /// Restrict results to these domains (Perplexity only).
    pub search_domain_filter: Vec<String>,

    /// "low", "medium" or "high" (Perplexity only).
    pub search_context_size: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProvidersOverrides {
    gemini: ProviderOverrides,
    perplexity: ProviderOverrides,
}

/// One `[providers.<name>]` table as written; absent keys keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderOverrides {
    enabled: Option<bool>,
    base_url: Option<String>,
    default_model: Option<String>,
    models: Option<Vec<String>>,
    api_key_env: Option<Vec<String>>,
    timeout_secs: Option<u64>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    top_k: Option<u32>,
    max_output_tokens: Option<u32>,
    grounding: Option<bool>,
    search_recency_filter: Option<String>,
    search_domain_filter: Option<Vec<String>>,
    search_context_size: Option<String>,
}

impl ProviderOverrides {
    fn apply(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            enabled: self.enabled.unwrap_or(base.enabled),
            base_url: self.base_url.unwrap_or(base.base_url),
            default_model: self.default_model.unwrap_or(base.default_model),
            models: self.models.unwrap_or(base.models),
            api_key_env: self.api_key_env.unwrap_or(base.api_key_env),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
            top_k: self.top_k.unwrap_or(base.top_k),
            max_output_tokens: self.max_output_tokens.unwrap_or(base.max_output_tokens),
            grounding: self.grounding.unwrap_or(base.grounding),
            search_recency_filter: self.search_recency_filter.or(base.search_recency_filter),
            search_domain_filter: self.search_domain_filter.unwrap_or(base.search_domain_filter),
            search_context_size: self.search_context_size.unwrap_or(base.search_context_size),
        }
    }
}

impl ProviderConfig {
    /// Default Gemini configuration.
    pub fn gemini() -> Self {
        Self {
            enabled: true,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            default_model: Provider::Gemini.default_model().to_string(),
            models: Vec::new(),
            api_key_env: vec![
                "GEMINI_API_KEY".to_string(),
                "NEXT_PUBLIC_GEMINI_API_KEY".to_string(),
                "GOOGLE_API_KEY".to_string(),
            ],
            timeout_secs: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            grounding: true,
            search_recency_filter: None,
            search_domain_filter: Vec::new(),
            search_context_size: default_search_context_size(),
        }
    }

    /// Default Perplexity configuration.
    pub fn perplexity() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.perplexity.ai".to_string(),
            default_model: Provider::Perplexity.default_model().to_string(),
            models: Vec::new(),
            api_key_env: vec!["PERPLEXITY_API_KEY".to_string()],
            timeout_secs: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            grounding: true,
            search_recency_filter: Some("day".to_string()),
            search_domain_filter: Vec::new(),
            search_context_size: default_search_context_size(),
        }
    }

    /// Effective HTTP timeout.
    pub fn timeout(&self, general: &GeneralConfig) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.unwrap_or(general.timeout_secs))
    }

    /// Returns the first non-empty API key among `api_key_env`.
    pub fn api_key_from_env(&self) -> Option<String> {
        self.api_key_env
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    /// Resolves the API key according to the credential policy.
    pub fn resolve_api_key(
        &self,
        provider: Provider,
        policy: MissingKeyPolicy,
    ) -> SearchDuelResult<String> {
        if let Some(key) = self.api_key_from_env() {
            return Ok(key);
        }

        match policy {
            MissingKeyPolicy::Placeholder => {
                tracing::warn!(
                    provider = %provider,
                    "No API key found in {:?}; using placeholder",
                    self.api_key_env
                );
                Ok(placeholder_key(provider))
            }
            MissingKeyPolicy::Fail => Err(SearchDuelError::MissingApiKey {
                provider: provider.display_name().to_string(),
                checked: self.api_key_env.join(", "),
            }),
        }
    }
}

/// Placeholder key sent when no key is configured and the policy allows it.
pub fn placeholder_key(provider: Provider) -> String {
    format!("your_{}_api_key_here", provider)
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_p() -> f64 {
    0.9
}

fn default_top_k() -> u32 {
    3
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_search_context_size() -> String {
    "high".to_string()
}

/// What to do when a provider's API key is not in the environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// Send a placeholder key; the provider rejects the call and the result
    /// carries the auth error.
    #[default]
    Placeholder,
    /// Refuse to build the executor.
    Fail,
}

/// Credential settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    /// Behavior when a key is missing.
    #[serde(default)]
    pub missing_key: MissingKeyPolicy,
}

/// Batch driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Pause between consecutive provider calls (in milliseconds).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Directory where reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Queries run when no queries file is given.
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            output_dir: default_output_dir(),
            queries: default_queries(),
        }
    }
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_queries() -> Vec<String> {
    vec![
        "What are today's top news headlines?".to_string(),
        "What is the current price of NVIDIA stock?".to_string(),
        "What are the latest developments in AI technology?".to_string(),
    ]
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> SearchDuelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SearchDuelResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            providers: ProvidersConfig::default(),
            credentials: CredentialsConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
