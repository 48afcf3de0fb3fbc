//! Search executors.
//!
//! One executor per hosted provider (Gemini, Perplexity), all behind the
//! [`SearchExecutor`] trait so callers only ever see a
//! [`QueryResult`](crate::types::responses::QueryResult).

mod base;
mod citations;
mod gemini;
mod perplexity;

pub use base::{ProviderReply, SearchExecutor, ANSWER_INSTRUCTION};
pub use citations::extract_markdown_citations;
pub use gemini::GeminiExecutor;
pub use perplexity::PerplexityExecutor;

use crate::types::config::Config;
use crate::types::requests::Provider;
use crate::SearchDuelResult;

/// Creates the executor for `provider` from the configuration.
///
/// The API key is resolved here, once, according to
/// `credentials.missing_key`.
pub fn create_executor(provider: Provider, config: &Config) -> SearchDuelResult<Box<dyn SearchExecutor>> {
    let provider_config = config.providers.get(provider);
    let api_key = provider_config.resolve_api_key(provider, config.credentials.missing_key)?;
    let timeout = provider_config.timeout(&config.general);

    let executor: Box<dyn SearchExecutor> = match provider {
        Provider::Gemini => Box::new(GeminiExecutor::from_config(provider_config, api_key, timeout)?),
        Provider::Perplexity => Box::new(PerplexityExecutor::from_config(provider_config, api_key, timeout)?),
    };

    Ok(executor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::MissingKeyPolicy;
    use crate::SearchDuelError;

    #[test]
    fn test_create_executor_matches_provider() {
        let config = Config::default_config();

        for provider in Provider::ALL {
            let executor = create_executor(provider, &config).unwrap();
            assert_eq!(executor.provider(), provider);
            assert_eq!(executor.default_model(), provider.default_model());
        }
    }

    #[test]
    fn test_create_executor_fails_fast_when_configured() {
        let mut config = Config::default_config();
        config.credentials.missing_key = MissingKeyPolicy::Fail;
        config.providers.gemini.api_key_env = vec!["SEARCHDUEL_UNSET_GEMINI_KEY".to_string()];

        let result = create_executor(Provider::Gemini, &config);

        assert!(matches!(result, Err(SearchDuelError::MissingApiKey { .. })));
    }
}
