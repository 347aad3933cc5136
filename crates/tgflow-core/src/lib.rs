//! tgflow Core - Sequential Update Processing
//!
//! This crate provides the update processing loop for tgflow bots,
//! including:
//! - Update: update events and the bot identity they are handled by
//! - Queue: the multi-producer, single-consumer update queue
//! - Scope: isolated per-update resource bundles
//! - Pipeline: the executor contract and a stage-chain implementation
//! - Completion: one-shot signals for callers awaiting an update
//! - Processor: the loop tying all of the above together
//! - Shutdown: the process-wide cancellation signal

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod scope;
pub mod shutdown;
pub mod update;

#[cfg(test)]
mod test_support;

pub use completion::{completion, CompletionHandle, CompletionReceiver};
pub use config::ProcessorConfig;
pub use error::{Error, Result};
pub use pipeline::{Flow, Pipeline, PipelineBuilder, PipelineExecutor, Stage};
pub use processor::{ProcessorStats, UpdateProcessor};
pub use queue::{update_channel, UpdateReceiver, UpdateSender};
pub use scope::{release_error, FnProvisioner, ReleaseFn, Scope, ScopeProvisioner};
pub use update::{BotIdentity, Outcome, Update, UpdateContext};

// Re-export shutdown module types
pub use shutdown::{wait_for_shutdown_signal, ShutdownController, TaskGuard};

// Components take the cancellation signal by this type
pub use tokio_util::sync::CancellationToken;
