use clap::Parser;
use searchduel::cli::{Cli, Commands};
use searchduel::types::config::Config;
use searchduel::SearchDuelResult;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> SearchDuelResult<()> {
    let cli = Cli::parse();

    // API keys come from the environment; load the env file before anything reads it
    let env_loaded = load_env_file(cli.env_file.as_deref());

    // Load configuration first (no logging yet)
    let config_result = if cli.config.exists() {
        Some(Config::load(&cli.config))
    } else {
        None
    };
    let config = match &config_result {
        Some(Ok(config)) => config.clone(),
        _ => Config::default_config(),
    };

    // Determine log level: CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("searchduel={}", log_level)
            .parse()
            .unwrap_or_else(|_| "searchduel=info".parse().expect("fallback directive is valid")),
    );

    // stdout carries JSON output, so logs always go to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if config.general.log_format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    match &config_result {
        Some(Err(e)) => tracing::warn!("Invalid configuration, using defaults: {}", e),
        Some(Ok(_)) => tracing::debug!("Configuration loaded from: {}", cli.config.display()),
        None => tracing::debug!("No configuration at {}, using defaults", cli.config.display()),
    }
    match env_loaded {
        Ok(Some(path)) => tracing::debug!("Environment loaded from: {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("Could not load environment file: {}", e),
    }

    match cli.command {
        Commands::Search {
            query,
            model,
            provider,
        } => {
            let has_query =
                searchduel::cli::commands::search(query.as_deref(), model.as_deref(), provider, &config)
                    .await?;
            if !has_query {
                std::process::exit(1);
            }
        }
        Commands::Compare {
            query,
            gemini_model,
            perplexity_model,
            output_dir,
            no_save,
        } => {
            searchduel::cli::commands::compare(
                &query,
                gemini_model.as_deref(),
                perplexity_model.as_deref(),
                output_dir.as_deref(),
                !no_save,
                &config,
            )
            .await?;
        }
        Commands::Batch {
            provider,
            model,
            queries_file,
            output_dir,
            delay_ms,
        } => {
            searchduel::cli::commands::batch(
                &provider,
                &model,
                queries_file.as_deref(),
                output_dir.as_deref(),
                delay_ms,
                &config,
            )
            .await?;
        }
        Commands::Init { path } => {
            searchduel::cli::commands::init(path).await?;
        }
        Commands::Status => {
            searchduel::cli::commands::status(&config).await?;
        }
        Commands::Version => {
            searchduel::cli::commands::version();
        }
    }

    Ok(())
}

/// Loads `path`, or `.env.local` then `.env` from the working directory when
/// no path is given. Parent directories are not searched.
///
/// Variables already set in the process environment are never overridden.
fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    if let Some(path) = path {
        dotenvy::from_path(path)?;
        return Ok(Some(path.to_path_buf()));
    }

    for candidate in [".env.local", ".env"] {
        let path = Path::new(candidate);
        match dotenvy::from_path(path) {
            Ok(()) => return Ok(Some(path.to_path_buf())),
            Err(e) if e.not_found() => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(None)
}
