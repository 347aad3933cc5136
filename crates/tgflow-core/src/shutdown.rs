//! Graceful shutdown
//!
//! Owns the process-wide cancellation signal. The processor and producers get
//! child tokens; `shutdown()` cancels them all and then waits for registered
//! tasks to finish, bounded by a timeout.
//!
//! ## Usage
//!
//! ```ignore
//! let shutdown = ShutdownController::new();
//! let processor = processor.spawn(shutdown.token());
//!
//! wait_for_shutdown_signal().await;
//! shutdown.shutdown().await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default shutdown timeout in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Coordinates shutdown of the processor and its producers
#[derive(Debug)]
pub struct ShutdownController {
    cancel_token: CancellationToken,
    shutdown_initiated: AtomicBool,
    active_tasks: AtomicU32,
    timeout: Duration,
}

impl ShutdownController {
    /// Create a controller with the default timeout
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS))
    }

    /// Create a controller with a custom timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            cancel_token: CancellationToken::new(),
            shutdown_initiated: AtomicBool::new(false),
            active_tasks: AtomicU32::new(0),
            timeout,
        })
    }

    /// Cancellation token for one component
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Register a task that shutdown should wait for
    pub fn register_task(self: &Arc<Self>) -> TaskGuard {
        self.active_tasks.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            controller: Arc::clone(self),
        }
    }

    /// Number of registered tasks still running
    #[must_use]
    pub fn active_task_count(&self) -> u32 {
        self.active_tasks.load(Ordering::SeqCst)
    }

    /// Cancel every token, then wait for registered tasks.
    ///
    /// Only the first call does anything.
    pub async fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Shutdown already initiated");
            return;
        }

        info!("Initiating graceful shutdown...");
        self.cancel_token.cancel();

        let drain_start = std::time::Instant::now();
        let check_interval = Duration::from_millis(50);

        loop {
            let active = self.active_task_count();
            if active == 0 {
                info!("All tasks completed gracefully");
                break;
            }

            let elapsed = drain_start.elapsed();
            if elapsed >= self.timeout {
                warn!(
                    active_tasks = active,
                    timeout_secs = self.timeout.as_secs(),
                    "Shutdown timeout exceeded, giving up on remaining tasks"
                );
                break;
            }

            debug!(active_tasks = active, "Waiting for tasks to complete...");
            tokio::time::sleep(check_interval).await;
        }

        info!("Graceful shutdown complete");
    }
}

/// Decrements the active task count when dropped
#[derive(Debug)]
pub struct TaskGuard {
    controller: Arc<ShutdownController>,
}

impl TaskGuard {
    /// Whether shutdown was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.controller.cancel_token.is_cancelled()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.controller.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wait for Ctrl+C or SIGTERM
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
