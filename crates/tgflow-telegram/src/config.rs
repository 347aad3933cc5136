//! Telegram configuration types

use crate::error::{Error, Result};
use std::time::Duration;

/// Default long-poll timeout, kept below the bot client's request timeout
pub const DEFAULT_POLL_TIMEOUT_SECS: u32 = 10;

/// Default pause after a failed poll
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Telegram bot configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// Seconds the server may hold a `getUpdates` call open
    pub poll_timeout_secs: u32,
    /// Seconds to wait after a failed poll
    pub retry_delay_secs: u64,
}

impl TelegramConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| Error::Config("TELEGRAM_BOT_TOKEN not set".to_string()))?;

        let poll_timeout_secs = std::env::var("TELEGRAM_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);

        let retry_delay_secs = std::env::var("TELEGRAM_RETRY_DELAY_SECS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_DELAY_SECS);

        Ok(Self::new(bot_token)
            .with_poll_timeout(poll_timeout_secs)
            .with_retry_delay(retry_delay_secs))
    }

    /// Create with a bot token
    #[must_use]
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }

    /// Set the long-poll timeout
    #[must_use]
    pub fn with_poll_timeout(mut self, secs: u32) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    /// Set the delay after a failed poll
    #[must_use]
    pub fn with_retry_delay(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }

    /// Delay after a failed poll
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
