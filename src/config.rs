//! Application configuration
//!
//! Loaded from the embedded defaults, optional files, and environment.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tgflow_core::ProcessorConfig;
use tgflow_telegram::TelegramConfig;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub telegram: TelegramAppConfig,
    #[serde(default)]
    pub shutdown: ShutdownAppConfig,
    #[serde(default)]
    pub bot: BotSettings,
}

/// Telegram overrides. The token always comes from `TELEGRAM_BOT_TOKEN`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramAppConfig {
    #[serde(default)]
    pub poll_timeout_secs: Option<u32>,
    #[serde(default)]
    pub retry_delay_secs: Option<u64>,
}

impl TelegramAppConfig {
    /// Layer file/env overrides on top of the env-derived Telegram config
    pub fn apply(&self, mut config: TelegramConfig) -> TelegramConfig {
        if let Some(secs) = self.poll_timeout_secs {
            config = config.with_poll_timeout(secs);
        }
        if let Some(secs) = self.retry_delay_secs {
            config = config.with_retry_delay(secs);
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownAppConfig {
    #[serde(default = "default_shutdown_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_shutdown_timeout_secs() -> u64 {
    tgflow_core::shutdown::DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

impl Default for ShutdownAppConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Behaviour of the bundled pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_echo")]
    pub echo: bool,
}

fn default_greeting() -> String {
    "Hi!".to_string()
}

fn default_echo() -> bool {
    true
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            echo: default_echo(),
        }
    }
}

/// Load configuration from files and environment
pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/local").required(false));

    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }

    let config = builder
        // 3. Environment variables (highest priority), e.g. TGFLOW_PROCESSOR__NAME
        .add_source(
            Environment::with_prefix("TGFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.processor.name, "telegram");
        assert!(config.processor.catch_panics);
        assert_eq!(config.shutdown.timeout_secs, 30);
        assert!(config.bot.echo);
        assert!(config.telegram.poll_timeout_secs.is_none());
    }

    #[test]
    fn test_telegram_overrides() {
        let overrides = TelegramAppConfig {
            poll_timeout_secs: Some(2),
            retry_delay_secs: None,
        };
        let config = overrides.apply(TelegramConfig::new("123:abc").with_retry_delay(9));

        assert_eq!(config.poll_timeout_secs, 2);
        assert_eq!(config.retry_delay_secs, 9);
    }
}
