//! Error types for tgflow-telegram

use thiserror::Error;

/// Telegram error type
#[derive(Debug, Error)]
pub enum Error {
    /// Bot API request failed
    #[error("telegram error: {0}")]
    Request(#[from] teloxide::RequestError),

    /// Missing or malformed configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
