//! Sequential update processor
//!
//! Drains the update queue one update at a time. Each update gets its own
//! scope, runs through the pipeline, has its completion handle signaled, and
//! has its scope released before the next update is dequeued. A failing update
//! is logged and dropped; it never stops the loop.
//!
//! ## Usage
//!
//! ```ignore
//! let (sender, receiver) = update_channel();
//! let processor = UpdateProcessor::new(bot, provisioner, pipeline, receiver, config)?;
//! let handle = processor.spawn(shutdown.token());
//!
//! sender.send(Update::new(payload))?;
//! ```

use crate::completion::CompletionHandle;
use crate::config::ProcessorConfig;
use crate::error::{Error, Result};
use crate::pipeline::PipelineExecutor;
use crate::queue::UpdateReceiver;
use crate::scope::ScopeProvisioner;
use crate::update::{BotIdentity, Outcome, UpdateContext};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Counters reported when the processor exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    /// Updates taken off the queue
    pub received: u64,
    /// Updates whose pipeline pass finished without error
    pub processed: u64,
    /// Updates dropped after a failure
    pub failed: u64,
    /// Updates whose pipeline stopped because shutdown was requested
    pub cancelled: u64,
    /// Updates dequeued after shutdown was requested and never started
    pub abandoned: u64,
}

/// Single-consumer update processor
pub struct UpdateProcessor<E: UpdateContext, S, P> {
    bot: Arc<E::Bot>,
    provisioner: Arc<S>,
    pipeline: Arc<P>,
    queue: UpdateReceiver<E>,
    config: ProcessorConfig,
    completions: TaskTracker,
    stats: ProcessorStats,
}

impl<E, S, P> UpdateProcessor<E, S, P>
where
    E: UpdateContext,
    S: ScopeProvisioner<Resources = E::Resources>,
    P: PipelineExecutor<E>,
{
    /// Create a processor.
    ///
    /// Fails if the config is invalid or the pipeline rejects itself.
    pub fn new(
        bot: Arc<E::Bot>,
        provisioner: Arc<S>,
        pipeline: Arc<P>,
        queue: UpdateReceiver<E>,
        config: ProcessorConfig,
    ) -> Result<Self> {
        config.validate()?;
        pipeline.check()?;

        Ok(Self {
            bot,
            provisioner,
            pipeline,
            queue,
            config,
            completions: TaskTracker::new(),
            stats: ProcessorStats::default(),
        })
    }

    /// Run the processor on its own task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<ProcessorStats> {
        tokio::spawn(self.run(cancel))
    }

    /// Consume updates until shutdown is requested or the queue closes
    pub async fn run(mut self, cancel: CancellationToken) -> ProcessorStats {
        // let whoever started us carry on first
        tokio::task::yield_now().await;
        info!(
            processor = %self.config.name,
            bot = self.bot.name(),
            "Update processor started"
        );

        loop {
            let update = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(processor = %self.config.name, "Shutdown requested, update processor stopping");
                    break;
                }
                next = self.queue.recv() => match next {
                    Some(update) => update,
                    None => {
                        info!(processor = %self.config.name, "Update queue closed");
                        break;
                    }
                },
            };
            self.stats.received += 1;

            if cancel.is_cancelled() {
                self.stats.abandoned += 1;
                info!(
                    processor = %self.config.name,
                    update_id = %update.id(),
                    "Shutdown requested, update processor stopping"
                );
                break;
            }

            let update_id = update.id();
            let result = self.guarded_process(update, &cancel).await;
            match result {
                Ok(()) => self.stats.processed += 1,
                Err(Error::Cancelled) => {
                    self.stats.cancelled += 1;
                    info!(update_id = %update_id, "Update processing cancelled");
                }
                Err(e) => {
                    self.stats.failed += 1;
                    error!(
                        processor = %self.config.name,
                        update_id = %update_id,
                        error = %e,
                        "Unexpected failure while processing update"
                    );
                }
            }
        }

        self.drain_completions().await;

        info!(
            processor = %self.config.name,
            received = self.stats.received,
            processed = self.stats.processed,
            failed = self.stats.failed,
            cancelled = self.stats.cancelled,
            abandoned = self.stats.abandoned,
            "Update processor stopped"
        );
        self.stats
    }

    /// One iteration, with panics from any step turned into an error
    async fn guarded_process(&self, update: E, cancel: &CancellationToken) -> Result<()> {
        let iteration = self.process(update, cancel);
        if !self.config.catch_panics {
            return iteration.await;
        }

        match AssertUnwindSafe(iteration).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(Error::Panicked(panic_message(payload.as_ref()))),
        }
    }

    /// One iteration: scope, populate, pipeline, completion, release
    async fn process(&self, mut update: E, cancel: &CancellationToken) -> Result<()> {
        let scope = self.provisioner.acquire()?;
        debug!(update_id = %update.id(), scope_id = %scope.id(), "Scope acquired");

        update.set_resources(scope.resources());
        update.set_client(self.bot.client().clone());
        update.set_bot(Arc::clone(&self.bot));

        let executed = self.execute(&mut update, cancel).await;

        if let Some(handle) = update.take_completion() {
            self.dispatch_completion(update.id(), handle, update.outcome().clone(), cancel);
        }

        match (executed, scope.release()) {
            (Ok(()), released) => released,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                error!(update_id = %update.id(), error = %release_err, "Scope release failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, update: &mut E, cancel: &CancellationToken) -> Result<()> {
        let pass = self.pipeline.execute(update, cancel);
        if !self.config.catch_panics {
            return pass.await;
        }

        match AssertUnwindSafe(pass).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(Error::PipelinePanicked(panic_message(payload.as_ref()))),
        }
    }

    /// Signal the completion handle off the loop's critical path
    fn dispatch_completion(
        &self,
        update_id: Uuid,
        handle: CompletionHandle,
        outcome: Outcome,
        cancel: &CancellationToken,
    ) {
        let cancel = cancel.clone();
        self.completions.spawn(async move {
            if cancel.is_cancelled() {
                debug!(update_id = %update_id, "Shutdown requested, completion dropped");
                return;
            }
            if !handle.complete(outcome) {
                debug!(update_id = %update_id, "Completion receiver gone");
            }
        });
    }

    async fn drain_completions(&self) {
        self.completions.close();
        let timeout = self.config.completion_drain_timeout();
        if tokio::time::timeout(timeout, self.completions.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.completions.len(),
                timeout_ms = self.config.completion_drain_timeout_ms,
                "Timed out waiting for completion signals"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
