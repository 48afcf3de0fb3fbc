//! Command-line interface for searchduel.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::requests::Provider;

/// searchduel - ask Gemini and Perplexity the same question and compare.
#[derive(Parser, Debug)]
#[command(name = "searchduel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "searchduel.toml")]
    pub config: PathBuf,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode.
    #[arg(short, long)]
    pub quiet: bool,

    /// Environment file with API keys (default: .env.local, then .env).
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Asks one provider and prints the answer as JSON.
    Search {
        /// Question to ask.
        query: Option<String>,

        /// Model identifier (default: the provider's default model).
        model: Option<String>,

        /// Provider to ask.
        #[arg(short, long, default_value = "gemini")]
        provider: Provider,
    },

    /// Asks Gemini and then Perplexity and compares the answers.
    Compare {
        /// Question to ask.
        query: String,

        /// Gemini model.
        #[arg(long)]
        gemini_model: Option<String>,

        /// Perplexity model.
        #[arg(long)]
        perplexity_model: Option<String>,

        /// Directory for the JSON report (default: batch.output_dir).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not write a JSON report.
        #[arg(long)]
        no_save: bool,
    },

    /// Runs a list of queries against one or more providers.
    Batch {
        /// Provider(s) to ask (default: every enabled provider).
        #[arg(short, long)]
        provider: Vec<Provider>,

        /// Model(s) to sweep, as provider=model (bare model with a single provider).
        #[arg(short, long)]
        model: Vec<String>,

        /// File with one query per line (default: batch.queries).
        #[arg(short = 'f', long)]
        queries_file: Option<PathBuf>,

        /// Directory for the JSON report (default: batch.output_dir).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Pause between calls in milliseconds (default: batch.delay_ms).
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Writes a default configuration file.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Shows provider settings and whether API keys are available.
    Status,

    /// Shows version.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args_are_optional() {
        let cli = Cli::try_parse_from(["searchduel", "search"]).unwrap();
        match cli.command {
            Commands::Search { query, model, provider } => {
                assert!(query.is_none());
                assert!(model.is_none());
                assert_eq!(provider, Provider::Gemini);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_positional_model_and_provider() {
        let cli = Cli::try_parse_from([
            "searchduel",
            "search",
            "What is Rust?",
            "sonar-pro",
            "--provider",
            "perplexity",
        ])
        .unwrap();

        match cli.command {
            Commands::Search { query, model, provider } => {
                assert_eq!(query.as_deref(), Some("What is Rust?"));
                assert_eq!(model.as_deref(), Some("sonar-pro"));
                assert_eq!(provider, Provider::Perplexity);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_batch_repeated_flags() {
        let cli = Cli::try_parse_from([
            "searchduel", "batch", "-p", "gemini", "-m", "gemini-1.5-pro", "-m", "gemini-1.5-flash",
        ])
        .unwrap();

        match cli.command {
            Commands::Batch { provider, model, .. } => {
                assert_eq!(provider, vec![Provider::Gemini]);
                assert_eq!(model.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["searchduel", "search", "q", "-p", "bing"]).is_err());
    }
}
