//! Update Queue
//!
//! Unbounded FIFO conduit between update producers and the processor:
//! - Any number of [`UpdateSender`] clones may enqueue
//! - Exactly one [`UpdateReceiver`] drains it
//! - The queue closes once every sender is dropped or the receiver closes it

use crate::error::{Error, Result};
use tokio::sync::mpsc;
use tracing::debug;

/// Create a connected sender/receiver pair
#[must_use]
pub fn update_channel<E>() -> (UpdateSender<E>, UpdateReceiver<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UpdateSender { tx }, UpdateReceiver { rx })
}

/// Producer side of the update queue
#[derive(Debug)]
pub struct UpdateSender<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for UpdateSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> UpdateSender<E> {
    /// Enqueue an update. Never waits.
    pub fn send(&self, update: E) -> Result<()> {
        self.tx.send(update).map_err(|_| {
            debug!("Update dropped, queue closed");
            Error::QueueClosed
        })
    }

    /// Whether the consumer side has gone away
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the consumer side has gone away
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Consumer side of the update queue
#[derive(Debug)]
pub struct UpdateReceiver<E> {
    rx: mpsc::UnboundedReceiver<E>,
}

impl<E> UpdateReceiver<E> {
    /// Wait for the next update.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Stop accepting new updates. Already queued updates can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Number of queued updates
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no updates are queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
