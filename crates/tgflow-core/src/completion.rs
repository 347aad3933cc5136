//! One-shot completion signaling
//!
//! A producer that wants to know when its update has been processed attaches a
//! [`CompletionHandle`] to the update and keeps the paired
//! [`CompletionReceiver`]. The processor completes the handle once the
//! pipeline pass is over, carrying the update's [`Outcome`].

use crate::error::{Error, Result};
use crate::update::Outcome;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Create a connected handle/receiver pair
#[must_use]
pub fn completion() -> (CompletionHandle, CompletionReceiver) {
    let (tx, rx) = oneshot::channel();
    (CompletionHandle { tx }, CompletionReceiver { rx })
}

/// Write side of a completion signal.
///
/// Completing consumes the handle, so an update can be completed at most once.
#[derive(Debug)]
pub struct CompletionHandle {
    tx: oneshot::Sender<Outcome>,
}

impl CompletionHandle {
    /// Complete the signal with the given outcome.
    ///
    /// Returns `false` if the receiver was already dropped.
    pub fn complete(self, outcome: Outcome) -> bool {
        self.tx.send(outcome).is_ok()
    }

    /// Whether the awaiting side has gone away
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read side of a completion signal
#[derive(Debug)]
pub struct CompletionReceiver {
    rx: oneshot::Receiver<Outcome>,
}

impl CompletionReceiver {
    /// Non-blocking check for a delivered outcome
    pub fn try_recv(&mut self) -> Option<Result<Outcome>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(Ok(outcome)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(Error::CompletionDropped)),
        }
    }
}

impl Future for CompletionReceiver {
    type Output = Result<Outcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| Error::CompletionDropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_delivers_outcome() {
        let (handle, rx) = completion();
        assert!(handle.complete(Outcome::Handled));
        assert_eq!(rx.await.unwrap(), Outcome::Handled);
    }

    #[tokio::test]
    async fn test_dropped_handle_resolves_with_error() {
        let (handle, rx) = completion();
        drop(handle);
        assert!(matches!(rx.await, Err(Error::CompletionDropped)));
    }

    #[test]
    fn test_complete_after_receiver_dropped() {
        let (handle, rx) = completion();
        drop(rx);
        assert!(handle.is_closed());
        assert!(!handle.complete(Outcome::Handled));
    }

    #[test]
    fn test_receiver_wakes_on_complete() {
        let (handle, rx) = completion();
        let mut rx = tokio_test::task::spawn(rx);
        tokio_test::assert_pending!(rx.poll());

        handle.complete(Outcome::Handled);
        assert!(rx.is_woken());
        let outcome = tokio_test::assert_ready_ok!(rx.poll());
        assert_eq!(outcome, Outcome::Handled);
    }

    #[test]
    fn test_try_recv_pending() {
        let (handle, mut rx) = completion();
        assert!(rx.try_recv().is_none());

        handle.complete(Outcome::Failed("bad input".to_string()));
        assert_eq!(
            rx.try_recv().unwrap().unwrap(),
            Outcome::Failed("bad input".to_string())
        );
    }
}
