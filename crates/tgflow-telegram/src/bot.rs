//! Telegram bot identity

use crate::config::TelegramConfig;
use crate::error::Result;
use teloxide::requests::{Request, Requester};
use teloxide::Bot;
use tgflow_core::{BotIdentity, Update};
use tracing::info;

/// Fallback name used until the bot has introduced itself
const UNKNOWN_USERNAME: &str = "telegram";

/// Update as produced by the long poller
pub type TelegramUpdate<R> = Update<teloxide::types::Update, TelegramBot, R>;

/// The active Telegram bot and its API client
#[derive(Debug, Clone)]
pub struct TelegramBot {
    bot: Bot,
    username: String,
}

impl TelegramBot {
    /// Create without contacting the API
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
            username: UNKNOWN_USERNAME.to_string(),
        }
    }

    /// Create and look up the bot's username with `getMe`
    pub async fn connect(config: &TelegramConfig) -> Result<Self> {
        let bot = Bot::new(&config.bot_token);
        let me = bot.get_me().send().await?;
        let username = me
            .user
            .username
            .clone()
            .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
        info!(username = %username, "Connected to Telegram");

        Ok(Self { bot, username })
    }

    /// The bot's username
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl BotIdentity for TelegramBot {
    type Client = Bot;

    fn client(&self) -> &Bot {
        &self.bot
    }

    fn name(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_bot_identity() {
        let bot = TelegramBot::new(&TelegramConfig::new("123:abc"));
        assert_eq!(bot.name(), UNKNOWN_USERNAME);
        assert_eq!(bot.username(), UNKNOWN_USERNAME);
        assert_eq!(bot.client().token(), "123:abc");
    }
}
