use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "context-index")]
#[command(about = "Ranked search over context provider items", long_about = None)]
pub struct Cli {
    /// Session configuration (.toml or .json)
    #[arg(short, long, env = "CONTEXT_INDEX_CONFIG")]
    pub config: PathBuf,

    /// Directory holding one `<provider>.json` item list per provider
    #[arg(short, long, env = "CONTEXT_INDEX_ITEMS")]
    pub items: PathBuf,

    /// Give up on a provider fetch after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Query {
        text: String,
        #[arg(short, long)]
        provider: Option<String>,
        #[arg(short = 'n', long, default_value = "25")]
        limit: usize,
    },
    Providers,
}
