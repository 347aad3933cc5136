//! Pipeline execution
//!
//! The processor treats the pipeline as an opaque, cancelable unit of work
//! behind [`PipelineExecutor`]. [`Pipeline`] is the stock executor: an ordered
//! chain of [`Stage`]s where any stage can claim the update and stop the chain.

use crate::error::{Error, Result};
use crate::update::{Outcome, UpdateContext};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs one update through the registered processing stages
#[async_trait]
pub trait PipelineExecutor<E: Send + 'static>: Send + Sync + 'static {
    /// Validate the pipeline before the processor starts
    fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Process one update. Long-running stages should watch `cancel`.
    async fn execute(&self, update: &mut E, cancel: &CancellationToken) -> Result<()>;
}

/// What the chain does after a stage returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Pass the update to the next stage
    Continue,
    /// The update is handled, skip the remaining stages
    Stop,
}

/// One link of a [`Pipeline`]
#[async_trait]
pub trait Stage<E: Send + 'static>: Send + Sync + 'static {
    /// Unique name within the pipeline
    fn name(&self) -> &str;

    /// Inspect or act on the update
    async fn handle(&self, update: &mut E, cancel: &CancellationToken) -> Result<Flow>;
}

/// Ordered chain of stages
pub struct Pipeline<E: Send + 'static> {
    stages: Vec<Arc<dyn Stage<E>>>,
}

impl<E: Send + 'static> Pipeline<E> {
    /// Start building a pipeline
    #[must_use]
    pub fn builder() -> PipelineBuilder<E> {
        PipelineBuilder::new()
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[async_trait]
impl<E: UpdateContext> PipelineExecutor<E> for Pipeline<E> {
    fn check(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(Error::PipelineCheck("no stages registered".to_string()));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name()) {
                return Err(Error::PipelineCheck(format!(
                    "duplicate stage '{}'",
                    stage.name()
                )));
            }
        }
        Ok(())
    }

    async fn execute(&self, update: &mut E, cancel: &CancellationToken) -> Result<()> {
        for stage in &self.stages {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let flow = stage.handle(update, cancel).await.map_err(|e| {
                debug!(update_id = %update.id(), stage = stage.name(), error = %e, "Stage failed");
                e
            })?;

            if flow == Flow::Stop {
                if update.outcome().is_unhandled() {
                    update.set_outcome(Outcome::Handled);
                }
                debug!(update_id = %update.id(), stage = stage.name(), "Update handled");
                return Ok(());
            }
        }

        debug!(update_id = %update.id(), "No stage handled update");
        Ok(())
    }
}

impl<E: Send + 'static> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Pipeline`]
pub struct PipelineBuilder<E: Send + 'static> {
    stages: Vec<Arc<dyn Stage<E>>>,
}

impl<E: Send + 'static> PipelineBuilder<E> {
    /// Create an empty builder
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage
    #[must_use]
    pub fn stage(mut self, stage: impl Stage<E>) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append an already shared stage
    #[must_use]
    pub fn shared_stage(mut self, stage: Arc<dyn Stage<E>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Finish the chain
    pub fn build(self) -> Pipeline<E> {
        Pipeline {
            stages: self.stages,
        }
    }
}

impl<E: Send + 'static> Default for PipelineBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
