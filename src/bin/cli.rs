//! newsdesk CLI
//!
//! Runs one ingestion pass against the configured source page and prints
//! the published articles, or validates a configuration file.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use newsdesk::{
    error::Result,
    models::Config,
    pipeline::NewsCoordinator,
    services::ArticleExtractor,
    store::ArticleStore,
};

/// newsdesk - BoxWall news ingestion pipeline
#[derive(Parser, Debug)]
#[command(name = "newsdesk", version, about = "BoxWall news ingestion pipeline")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "newsdesk.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one ingestion pass and print the published articles
    Fetch {
        /// Override the source page URL
        #[arg(long)]
        url: Option<String>,

        /// Override the request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the articles as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fetch { url, timeout, json } => {
            let mut config = Config::load_or_default(&cli.config);
            if let Some(url) = url {
                config.feed.source_url = url;
            }
            if let Some(timeout) = timeout {
                config.feed.timeout_secs = timeout;
            }
            config.validate()?;

            log::info!("Fetching news from {}", config.feed.source_url);

            let store = Arc::new(ArticleStore::new());
            let coordinator = NewsCoordinator::new(Arc::new(config), Arc::clone(&store))?;

            if let Err(error) = coordinator.refresh().await {
                log::error!("Ingestion task failed: {error}");
            }

            let state = store.snapshot();
            if let Some(message) = &state.error_message {
                log::warn!("{message}");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&state.articles)?);
            } else {
                let now = Utc::now();
                for article in &state.articles {
                    println!("{}  ({})", article.title, article.time_ago(now));
                    let summary = article.summary();
                    if !summary.is_empty() {
                        println!("    {summary}");
                    }
                    println!("    {}", article.source_url);
                }
            }

            log::info!(
                "{} articles{}",
                state.articles.len(),
                if state.used_fallback {
                    " (sample data)"
                } else {
                    ""
                }
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = Config::load(&cli.config)?;
            config.validate()?;

            // Selector strings must also compile
            ArticleExtractor::new(&config)?;

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
