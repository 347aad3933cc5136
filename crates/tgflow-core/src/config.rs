//! Processor configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an update processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Name used in log lines
    #[serde(default = "default_name")]
    pub name: String,
    /// Turn pipeline panics into per-update failures instead of killing the loop
    #[serde(default = "default_catch_panics")]
    pub catch_panics: bool,
    /// How long to wait for outstanding completion signals on exit, in milliseconds
    #[serde(default = "default_completion_drain_timeout_ms")]
    pub completion_drain_timeout_ms: u64,
}

fn default_name() -> String {
    "updates".to_string()
}

fn default_catch_panics() -> bool {
    true
}

fn default_completion_drain_timeout_ms() -> u64 {
    5000
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            catch_panics: default_catch_panics(),
            completion_drain_timeout_ms: default_completion_drain_timeout_ms(),
        }
    }
}

impl ProcessorConfig {
    /// Set the processor name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable panic isolation
    #[must_use]
    pub fn with_catch_panics(mut self, enabled: bool) -> Self {
        self.catch_panics = enabled;
        self
    }

    /// Set the completion drain timeout
    #[must_use]
    pub fn with_completion_drain_timeout(mut self, timeout: Duration) -> Self {
        self.completion_drain_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Completion drain timeout as a duration
    #[must_use]
    pub fn completion_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_drain_timeout_ms)
    }

    /// Reject unusable settings
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig {
                field: "processor.name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
