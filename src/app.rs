//! Bot runtime
//!
//! Wires the long poller, the update processor and the shutdown controller.

use crate::config::AppConfig;
use crate::resources::acquire_resources;
use crate::stages::{build_pipeline, AppUpdate};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tgflow_core::{
    update_channel, wait_for_shutdown_signal, FnProvisioner, PipelineExecutor, ShutdownController,
    UpdateProcessor,
};
use tgflow_telegram::{LongPoller, TelegramBot, TelegramConfig};
use tracing::{error, info, warn};

/// Run the bot until Ctrl+C / SIGTERM
pub async fn run(config: AppConfig) -> Result<()> {
    let telegram_config = config
        .telegram
        .apply(TelegramConfig::from_env().context("Telegram is not configured")?);
    let bot = Arc::new(
        TelegramBot::connect(&telegram_config)
            .await
            .context("Failed to reach the Telegram Bot API")?,
    );

    let shutdown =
        ShutdownController::with_timeout(Duration::from_secs(config.shutdown.timeout_secs));
    let (sender, receiver) = update_channel::<AppUpdate>();

    let processor = UpdateProcessor::new(
        Arc::clone(&bot),
        Arc::new(FnProvisioner::new(acquire_resources)),
        Arc::new(build_pipeline(&config.bot)),
        receiver,
        config.processor.clone(),
    )
    .context("Failed to build update processor")?;

    let processor_guard = shutdown.register_task();
    let processor_token = shutdown.token();
    let processor_task = tokio::spawn(async move {
        let _guard = processor_guard;
        processor.run(processor_token).await
    });

    let poller = LongPoller::new(&bot, telegram_config);
    let poller_guard = shutdown.register_task();
    let poller_token = shutdown.token();
    let mut poller_task = tokio::spawn(async move {
        let _guard = poller_guard;
        if let Err(e) = poller.run(sender, poller_token).await {
            error!(error = %e, "Long polling failed");
        }
    });

    info!(bot = %bot.username(), "tgflow is running, press Ctrl+C to stop");

    tokio::select! {
        _ = wait_for_shutdown_signal() => {}
        _ = &mut poller_task => {
            warn!("Long polling ended, shutting down");
        }
    }

    shutdown.shutdown().await;

    let stats = processor_task.await.context("Update processor task failed")?;
    info!(
        received = stats.received,
        processed = stats.processed,
        failed = stats.failed,
        cancelled = stats.cancelled,
        abandoned = stats.abandoned,
        "Final processor stats"
    );
    Ok(())
}

/// Validate configuration and pipeline without starting the bot
pub fn check(config: &AppConfig) -> Result<()> {
    config
        .processor
        .validate()
        .context("Invalid processor configuration")?;

    let pipeline = build_pipeline(&config.bot);
    pipeline.check().context("Invalid pipeline")?;

    let telegram = config
        .telegram
        .apply(TelegramConfig::from_env().context("Telegram is not configured")?);

    println!("processor:   {}", config.processor.name);
    println!("stages:      {}", pipeline.stage_names().join(" -> "));
    println!(
        "poll:        {}s timeout, {}s retry delay",
        telegram.poll_timeout_secs, telegram.retry_delay_secs
    );
    println!("shutdown:    {}s timeout", config.shutdown.timeout_secs);
    println!("\nConfiguration OK");
    Ok(())
}
