//! Sheetbridge - Excel to Google Sheets conversion
//!
//! CLI entry point.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sheetbridge=info,sheetbridge_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    // Logs go to stderr so `--json` output on stdout stays parseable
    if cli.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if cli.command.is_some() {
        info!("Starting Sheetbridge v{}", env!("CARGO_PKG_VERSION"));
    }

    cli::run(cli).await
}
