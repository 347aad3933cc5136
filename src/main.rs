//! tgflow - Sequential Telegram Update Processor
//!
//! CLI entry point for the bot.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod config;
mod resources;
mod stages;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // TGFLOW_LOG_FORMAT=json switches to structured output
    let json = std::env::var("TGFLOW_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tgflow=info,tgflow_core=info,tgflow_telegram=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    let cli = cli::Cli::parse();
    info!("Starting tgflow v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli).await
}
