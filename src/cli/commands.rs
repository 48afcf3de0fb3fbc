//! Implementation of the searchduel CLI commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::{load_queries, write_report, BatchRunner};
use crate::compare::{Comparator, ComparisonReport};
use crate::executors::{create_executor, SearchExecutor};
use crate::types::config::Config;
use crate::types::requests::{Provider, QueryRequest};
use crate::types::responses::{QueryResult, SearchOutput};
use crate::{SearchDuelError, SearchDuelResult};

/// Asks one provider and prints a single JSON object on stdout.
///
/// Returns `Ok(false)` when no query was given; the caller exits with 1.
pub async fn search(
    query: Option<&str>,
    model: Option<&str>,
    provider: Provider,
    config: &Config,
) -> SearchDuelResult<bool> {
    let query = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q,
        _ => {
            println!("{}", serde_json::to_string(&SearchOutput::error("No query provided"))?);
            return Ok(false);
        }
    };

    let output = match create_executor(provider, config) {
        Ok(executor) => {
            let mut request = QueryRequest::new(query);
            if let Some(m) = model {
                request = request.with_model(m);
            }
            SearchOutput::from(executor.search(&request).await)
        }
        Err(e) => SearchOutput::error(e.to_string()),
    };

    println!("{}", serde_json::to_string(&output)?);
    Ok(true)
}

/// Asks Gemini, then Perplexity, prints both answers and a comparison.
pub async fn compare(
    query: &str,
    gemini_model: Option<&str>,
    perplexity_model: Option<&str>,
    output_dir: Option<&Path>,
    save: bool,
    config: &Config,
) -> SearchDuelResult<()> {
    let delay = Duration::from_millis(config.batch.delay_ms);

    let gemini = run_one(Provider::Gemini, query, gemini_model, config).await;
    print_result(&gemini);

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let perplexity = run_one(Provider::Perplexity, query, perplexity_model, config).await;
    print_result(&perplexity);

    let comparison = Comparator::compare(&gemini, &perplexity);
    println!("{}", "=".repeat(50));
    println!("Comparison");
    println!("{}", "=".repeat(50));
    print!("{}", comparison.render());

    if save {
        let dir = output_dir.unwrap_or(config.batch.output_dir.as_path());
        let report = ComparisonReport::new(vec![gemini, perplexity], comparison);
        let path = write_report(&report, dir, "comparison_results")?;
        println!("\nResults saved to: {}", path.display());
    }

    Ok(())
}

/// Runs the batch driver and writes its report.
pub async fn batch(
    providers: &[Provider],
    models: &[String],
    queries_file: Option<&Path>,
    output_dir: Option<&Path>,
    delay_ms: Option<u64>,
    config: &Config,
) -> SearchDuelResult<()> {
    let queries = match queries_file {
        Some(path) => load_queries(path)?,
        None => config.batch.queries.clone(),
    };

    if queries.is_empty() {
        println!("No queries to run.");
        return Ok(());
    }

    let providers: Vec<Provider> = if providers.is_empty() {
        Provider::ALL
            .into_iter()
            .filter(|p| config.providers.get(*p).enabled)
            .collect()
    } else {
        providers.to_vec()
    };

    let mut executors: Vec<Box<dyn SearchExecutor>> = Vec::new();
    for provider in &providers {
        executors.push(create_executor(*provider, config)?);
    }

    if executors.is_empty() {
        println!("No providers enabled in the configuration.");
        return Ok(());
    }

    let sweeps = model_sweeps(models, &providers, config)?;
    let delay = Duration::from_millis(delay_ms.unwrap_or(config.batch.delay_ms));

    let runner = sweeps
        .into_iter()
        .fold(BatchRunner::new(executors).with_delay(delay), |runner, (provider, models)| {
            runner.with_models(provider, models)
        });

    let progress = ProgressBar::new(runner.total_calls(queries.len()) as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let report = runner
        .run_with_progress(&queries, |result| {
            progress.set_message(format!("{} ({})", result.provider.display_name(), result.model));
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    for entry in &report.entries {
        println!("{}", entry.query);
        for result in &entry.results {
            match &result.error {
                Some(e) => println!("  ✗ {} [{}] - error: {}", result.provider.display_name(), result.model, e),
                None => println!(
                    "  ✓ {} [{}] - {:.2}s, {} sources, {} chars",
                    result.provider.display_name(),
                    result.model,
                    result.elapsed_seconds,
                    result.citations.len(),
                    result.answer_length()
                ),
            }
        }
    }

    let dir = output_dir.unwrap_or(config.batch.output_dir.as_path());
    let prefix = match providers.as_slice() {
        [single] => format!("{}_test_results", single),
        _ => "comparison_results".to_string(),
    };
    let path = write_report(&report, dir, &prefix)?;

    println!();
    println!(
        "{} calls, {} failed",
        report.entries.iter().map(|e| e.results.len()).sum::<usize>(),
        report.error_count()
    );
    println!("Results saved to: {}", path.display());

    Ok(())
}

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> SearchDuelResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("searchduel.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("searchduel initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Put GEMINI_API_KEY and PERPLEXITY_API_KEY in .env.local");
    println!("  2. Check the setup: searchduel status");
    println!("  3. Ask something: searchduel compare \"What is new in Rust?\"");

    Ok(())
}

/// Shows provider settings and key availability.
pub async fn status(config: &Config) -> SearchDuelResult<()> {
    println!("Provider status\n");

    for provider in Provider::ALL {
        let settings = config.providers.get(provider);
        let name = provider.display_name();

        if !settings.enabled {
            println!("  ○ {} - disabled", name);
            continue;
        }

        if settings.api_key_from_env().is_some() {
            println!("  ✓ {} - API key found", name);
        } else {
            println!(
                "  ✗ {} - no API key (checked: {})",
                name,
                settings.api_key_env.join(", ")
            );
        }
        println!("      endpoint: {}", settings.base_url);
        println!("      default model: {}", settings.default_model);
        println!("      timeout: {}s", settings.timeout(&config.general).as_secs());
    }

    println!();
    println!("Missing keys policy: {:?}", config.credentials.missing_key);

    Ok(())
}

/// Shows version.
pub fn version() {
    println!("searchduel {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Search-grounded answers from Gemini and Perplexity, side by side");
}

async fn run_one(provider: Provider, query: &str, model: Option<&str>, config: &Config) -> QueryResult {
    let mut request = QueryRequest::new(query);
    if let Some(m) = model {
        request = request.with_model(m);
    }

    match create_executor(provider, config) {
        Ok(executor) => executor.search(&request).await,
        Err(e) => {
            let model = request.model_or(&config.providers.get(provider).default_model).to_string();
            QueryResult::failure(provider, query, model, e.to_string())
        }
    }
}

/// Resolves `-m` values into per-provider model lists.
///
/// Values are `provider=model`, or a bare model when a single provider is
/// selected. Providers without any `-m` value use `[providers.<name>] models`.
fn model_sweeps(
    specs: &[String],
    providers: &[Provider],
    config: &Config,
) -> SearchDuelResult<Vec<(Provider, Vec<String>)>> {
    let mut sweeps: Vec<(Provider, Vec<String>)> = providers
        .iter()
        .map(|p| (*p, Vec::new()))
        .collect();

    for spec in specs {
        let (provider, model) = match spec.split_once('=') {
            Some((provider, model)) => (provider.parse::<Provider>()?, model.trim()),
            None => match providers {
                [single] => (*single, spec.trim()),
                _ => {
                    return Err(SearchDuelError::config(format!(
                        "model '{}' is ambiguous with several providers; use provider=model",
                        spec
                    )))
                }
            },
        };

        if model.is_empty() {
            return Err(SearchDuelError::config(format!("empty model in '{}'", spec)));
        }

        match sweeps.iter_mut().find(|(p, _)| *p == provider) {
            Some((_, models)) => models.push(model.to_string()),
            None => {
                return Err(SearchDuelError::config(format!(
                    "model '{}' given for {}, which is not selected",
                    model, provider
                )))
            }
        }
    }

    for (provider, models) in &mut sweeps {
        if models.is_empty() {
            models.clone_from(&config.providers.get(*provider).models);
        }
    }

    Ok(sweeps)
}

fn print_result(result: &QueryResult) {
    let name = result.provider.display_name();

    println!("\n[{}] {} ({})", name, result.query, result.model);
    println!("{}", "-".repeat(50));

    if let Some(error) = &result.error {
        println!("[{}] Error: {}", name, error);
        return;
    }

    println!("{}", result.answer);

    if result.citations.is_empty() {
        println!("\n[{}] No sources found", name);
    } else {
        println!("\n[{}] Sources:", name);
        for citation in &result.citations {
            println!("  - {}: {}", citation.title, citation.url);
        }
    }

    if let Some(usage) = result.usage {
        println!(
            "\n[{}] Tokens: {} prompt, {} completion, {} total",
            name, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }

    println!("\n[{}] Response time: {:.2}s", name, result.elapsed_seconds);
}
