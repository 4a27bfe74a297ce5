use anyhow::Context;
use clap::Parser;
use context_index::cli::{Cli, Commands};
use context_index::{ContextState, JsonDirSource, LoaderOptions, SessionConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> context_index::Result<()> {
    let cli = Cli::parse();
    context_index::tracing::init(cli.log_json);

    let config = SessionConfig::load(&cli.config)
        .with_context(|| format!("Failed to load session config {}", cli.config.display()))?;
    let options = LoaderOptions {
        fetch_timeout: cli.timeout_ms.map(Duration::from_millis),
        ..LoaderOptions::default()
    };
    let state = ContextState::new(config, Arc::new(JsonDirSource::new(&cli.items)), options);

    tracing::info!("Loading context providers from {}", cli.items.display());
    let report = state.load_all().await;
    for error in state.failures() {
        tracing::warn!("Provider unavailable: {}", error);
    }
    if report.dropped_items > 0 {
        tracing::warn!("Dropped {} malformed or duplicate items", report.dropped_items);
    }

    match cli.command {
        Commands::Query {
            text,
            provider,
            limit,
        } => {
            let items =
                state.get_submenu_context_items_limited(provider.as_deref(), &text, Some(limit));
            if items.is_empty() {
                eprintln!("No matches for '{}'", text);
            }
            for item in items {
                println!("{}", item);
            }
        }
        Commands::Providers => {
            for status in state.provider_status() {
                let load = match (&status.failure, status.loaded) {
                    (Some(error), _) => format!("failed: {}", error),
                    (None, true) => "loaded".to_string(),
                    (None, false) => "pending".to_string(),
                };
                println!("{:<16} {:>6} items  {}", status.name, status.item_count, load);
            }
        }
    }

    state.shutdown().await;
    Ok(())
}
