//! CLI module for tgflow
//!
//! - `run`: start the bot (default)
//! - `check`: validate configuration and pipeline

use clap::{Parser, Subcommand};

/// tgflow Telegram bot runner
#[derive(Parser, Debug)]
#[command(name = "tgflow")]
#[command(about = "Sequential Telegram update processor")]
#[command(version)]
pub struct Cli {
    /// Extra configuration file, layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot (default)
    Run,
    /// Validate configuration and pipeline
    Check,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => crate::app::run(config).await,
        Commands::Check => crate::app::check(&config),
    }
}
