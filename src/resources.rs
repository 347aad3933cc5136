//! Per-update resources handed to the pipeline

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tgflow_core::ReleaseFn;
use tracing::debug;

/// Scratch state that lives exactly as long as one update
#[derive(Debug)]
pub struct UpdateResources {
    started_at: Instant,
    replies: Arc<AtomicU32>,
}

impl UpdateResources {
    /// Count a reply sent while handling this update
    pub fn record_reply(&self) {
        self.replies.fetch_add(1, Ordering::Relaxed);
    }

    /// Replies sent so far
    pub fn replies(&self) -> u32 {
        self.replies.load(Ordering::Relaxed)
    }

    /// Time since the scope was acquired
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Scope factory used by the processor
pub fn acquire_resources() -> tgflow_core::Result<(UpdateResources, ReleaseFn)> {
    let started_at = Instant::now();
    let replies = Arc::new(AtomicU32::new(0));

    let resources = UpdateResources {
        started_at,
        replies: Arc::clone(&replies),
    };
    let release: ReleaseFn = Box::new(move || {
        debug!(
            replies = replies.load(Ordering::Relaxed),
            elapsed_ms = whole_millis(started_at.elapsed()),
            "Update resources released"
        );
        Ok(())
    });

    Ok((resources, release))
}

fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
