//! chainmeta CLI
//!
//! Loads a chain and token row file, then answers one query against the
//! registry or a chain's RPC node.

mod commands;
mod config;
mod store;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use chainmeta::ChainMeta;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::Command;
use config::CliConfig;
use store::JsonRowStore;

#[derive(Debug, Parser)]
#[command(name = "chainmeta", version, about = "Inspect chains, tokens and balances")]
struct Cli {
    /// JSON config file (defaults to ./chainmeta.json when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Row file, overriding the config and CHAINMETA_ROWS
    #[arg(long, short)]
    rows: Option<PathBuf>,

    /// Per-call RPC timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(rows) = cli.rows {
        config.rows = rows;
    }
    if let Some(secs) = cli.timeout {
        config.core.provider = config.core.provider.with_timeout(secs);
    }
    // One-shot queries never need the reload schedule.
    config.core.registry.reload_interval_secs = 0;

    let store = Arc::new(JsonRowStore::new(config.rows.clone()));
    let meta = ChainMeta::builder(store).config(config.core).build()?;
    let report = meta.start().await?;
    info!(
        rows = %config.rows.display(),
        chains = report.loaded,
        skipped = report.skipped,
        "registry ready"
    );

    let result = commands::run(&meta, cli.command).await;
    meta.shutdown();
    result
}
