//! tgflow Telegram - Bot API collaborators
//!
//! This crate connects the tgflow processor to Telegram:
//! - Bot: the `teloxide`-backed bot identity
//! - Polling: a long-polling producer feeding the update queue

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bot;
pub mod config;
pub mod error;
pub mod polling;

pub use bot::{TelegramBot, TelegramUpdate};
pub use config::TelegramConfig;
pub use error::{Error, Result};
pub use polling::LongPoller;
