//! Error types for tgflow-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// The scope provisioner could not build a resource bundle
    #[error("scope acquisition failed: {0}")]
    ScopeAcquire(String),

    /// A scope's release function reported a failure
    #[error("scope release failed: {0}")]
    ScopeRelease(String),

    /// A pipeline stage returned an error
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// A pipeline stage panicked
    #[error("pipeline panicked: {0}")]
    PipelinePanicked(String),

    /// Scope handling or update population panicked outside the pipeline
    #[error("update processing panicked: {0}")]
    Panicked(String),

    /// The pipeline rejected its own configuration
    #[error("pipeline check failed: {0}")]
    PipelineCheck(String),

    /// Work was stopped because shutdown was requested
    #[error("operation cancelled")]
    Cancelled,

    /// The update queue no longer accepts updates
    #[error("update queue closed")]
    QueueClosed,

    /// The completion handle was dropped without being completed
    #[error("completion handle dropped")]
    CompletionDropped,

    /// Invalid configuration
    #[error("invalid configuration: {field}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error came from a cooperative cancellation rather than a fault
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
