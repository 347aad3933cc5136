//! Bundled processing stages
//!
//! - `log`: traces every update
//! - `commands`: answers `/start`, `/help` and `/ping`
//! - `echo`: repeats plain text back (optional)

use crate::config::BotSettings;
use crate::resources::UpdateResources;
use async_trait::async_trait;
use teloxide::requests::{Request, Requester};
use teloxide::types::{ChatId, UpdateKind};
use tgflow_core::{
    CancellationToken, Error, Flow, Outcome, Pipeline, Result, Stage, UpdateContext,
};
use tgflow_telegram::TelegramUpdate;
use tracing::debug;

/// Update type flowing through the bundled pipeline
pub type AppUpdate = TelegramUpdate<UpdateResources>;

/// Build the pipeline for the given settings
pub fn build_pipeline(settings: &BotSettings) -> Pipeline<AppUpdate> {
    let mut builder = Pipeline::builder().stage(LogStage).stage(CommandStage {
        greeting: settings.greeting.clone(),
    });
    if settings.echo {
        builder = builder.stage(EchoStage);
    }
    builder.build()
}

/// Chat and text of a plain text message
fn text_message(update: &AppUpdate) -> Option<(ChatId, &str)> {
    match &update.payload().kind {
        UpdateKind::Message(msg) => msg.text().map(|text| (msg.chat.id, text)),
        _ => None,
    }
}

/// Command name without arguments or `@botname` suffix
fn parse_command(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    first.split('@').next()
}

async fn reply(
    update: &AppUpdate,
    chat_id: ChatId,
    text: String,
    cancel: &CancellationToken,
) -> Result<()> {
    let bot = update
        .client()
        .ok_or_else(|| Error::Internal("update has no client".to_string()))?;

    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        sent = bot.send_message(chat_id, text).send() => {
            sent.map_err(|e| Error::Pipeline(e.to_string()))?;
            if let Some(resources) = update.resources() {
                resources.record_reply();
            }
            Ok(())
        }
    }
}

struct LogStage;

#[async_trait]
impl Stage<AppUpdate> for LogStage {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, update: &mut AppUpdate, _cancel: &CancellationToken) -> Result<Flow> {
        debug!(
            update_id = %update.id(),
            telegram_update_id = update.payload().id.0,
            queued_ms = (chrono::Utc::now() - update.received_at()).num_milliseconds(),
            "Processing update"
        );
        Ok(Flow::Continue)
    }
}

struct CommandStage {
    greeting: String,
}

#[async_trait]
impl Stage<AppUpdate> for CommandStage {
    fn name(&self) -> &str {
        "commands"
    }

    async fn handle(&self, update: &mut AppUpdate, cancel: &CancellationToken) -> Result<Flow> {
        let Some((chat_id, text)) = text_message(update) else {
            return Ok(Flow::Continue);
        };
        let Some(command) = parse_command(text).map(str::to_string) else {
            return Ok(Flow::Continue);
        };

        let answer = match command.as_str() {
            "/start" | "/help" => self.greeting.clone(),
            "/ping" => "pong".to_string(),
            _ => {
                reply(update, chat_id, format!("Unknown command {}", command), cancel).await?;
                update.set_outcome(Outcome::Failed(format!("unknown command {}", command)));
                return Ok(Flow::Stop);
            }
        };

        reply(update, chat_id, answer, cancel).await?;
        Ok(Flow::Stop)
    }
}

struct EchoStage;

#[async_trait]
impl Stage<AppUpdate> for EchoStage {
    fn name(&self) -> &str {
        "echo"
    }

    async fn handle(&self, update: &mut AppUpdate, cancel: &CancellationToken) -> Result<Flow> {
        let Some((chat_id, text)) = text_message(update) else {
            return Ok(Flow::Continue);
        };
        let text = text.to_string();

        reply(update, chat_id, text, cancel).await?;
        Ok(Flow::Stop)
    }
}
