//! Long-polling producer
//!
//! Pulls updates from the Bot API with `getUpdates` and enqueues them for the
//! processor. The offset advances past every enqueued update so Telegram does
//! not deliver it again.

use crate::bot::{TelegramBot, TelegramUpdate};
use crate::config::TelegramConfig;
use crate::error::Result;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::requests::{Request, Requester};
use std::time::Duration;
use teloxide::types::Update as RawUpdate;
use teloxide::Bot;
use tgflow_core::{BotIdentity, CancellationToken, Update, UpdateSender};
use tracing::{debug, info, warn};

/// Telegram long poller
pub struct LongPoller {
    bot: Bot,
    config: TelegramConfig,
}

impl LongPoller {
    /// Create a poller sharing the identity's client
    #[must_use]
    pub fn new(bot: &TelegramBot, config: TelegramConfig) -> Self {
        Self {
            bot: bot.client().clone(),
            config,
        }
    }

    /// Poll until shutdown is requested or the queue closes
    pub async fn run<R>(
        &self,
        sender: UpdateSender<TelegramUpdate<R>>,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        R: Send + Sync + 'static,
    {
        // getUpdates is refused while a webhook is registered
        self.bot.delete_webhook().send().await?;
        info!(
            poll_timeout_secs = self.config.poll_timeout_secs,
            "Telegram long polling started"
        );

        let mut offset: Option<i32> = None;

        loop {
            let mut request = self.bot.get_updates().timeout(self.config.poll_timeout_secs);
            if let Some(offset) = offset {
                request = request.offset(offset);
            }

            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sender.closed() => {
                    info!("Update queue closed, stopping long polling");
                    break;
                }
                polled = request.send() => polled,
            };

            match polled {
                Ok(updates) => {
                    if !enqueue_batch(&sender, updates, &mut offset) {
                        info!("Update queue closed, stopping long polling");
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed");
                    if !wait_before_retry(self.config.retry_delay(), &cancel).await {
                        break;
                    }
                }
            }
        }

        info!("Telegram long polling stopped");
        Ok(())
    }
}

/// Enqueue one `getUpdates` batch, moving `offset` past every update sent.
///
/// Returns `false` once the queue is closed.
fn enqueue_batch<R>(
    sender: &UpdateSender<TelegramUpdate<R>>,
    updates: Vec<RawUpdate>,
    offset: &mut Option<i32>,
) -> bool
where
    R: Send + Sync + 'static,
{
    if !updates.is_empty() {
        debug!(count = updates.len(), "Received updates");
    }
    for update in updates {
        let next = update.id.as_offset();
        if sender.send(Update::new(update)).is_err() {
            return false;
        }
        *offset = Some(next);
    }
    true
}

/// Sleep for the retry delay. Returns `false` if shutdown was requested first.
async fn wait_before_retry(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::{UpdateId, UpdateKind};
    use tgflow_core::update_channel;

    fn raw_update(id: u32) -> RawUpdate {
        RawUpdate {
            id: UpdateId(id),
            kind: UpdateKind::Error(serde_json::Value::Null),
        }
    }

    #[tokio::test]
    async fn test_batch_enqueued_in_order_and_offset_advanced() {
        let (sender, mut receiver) = update_channel::<TelegramUpdate<()>>();
        let mut offset = None;

        assert!(enqueue_batch(
            &sender,
            vec![raw_update(10), raw_update(11), raw_update(12)],
            &mut offset
        ));

        assert_eq!(offset, Some(UpdateId(12).as_offset()));
        assert_eq!(receiver.len(), 3);
        for expected in [10, 11, 12] {
            let update = receiver.recv().await.unwrap();
            assert_eq!(update.payload().id, UpdateId(expected));
        }
    }

    #[test]
    fn test_empty_batch_keeps_offset() {
        let (sender, _receiver) = update_channel::<TelegramUpdate<()>>();
        let mut offset = Some(5);

        assert!(enqueue_batch(&sender, Vec::new(), &mut offset));
        assert_eq!(offset, Some(5));
    }

    #[test]
    fn test_closed_queue_stops_batch() {
        let (sender, receiver) = update_channel::<TelegramUpdate<()>>();
        drop(receiver);
        let mut offset = None;

        assert!(!enqueue_batch(&sender, vec![raw_update(1)], &mut offset));
        // nothing was handed over, so Telegram must deliver it again
        assert_eq!(offset, None);
    }

    #[tokio::test]
    async fn test_retry_wait_elapses() {
        let cancel = CancellationToken::new();
        assert!(wait_before_retry(Duration::from_millis(5), &cancel).await);
    }

    #[tokio::test]
    async fn test_retry_wait_cut_short_by_shutdown() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let waited = tokio::time::timeout(
            Duration::from_secs(1),
            wait_before_retry(Duration::from_secs(3600), &cancel),
        )
        .await
        .expect("shutdown interrupts the retry delay");
        assert!(!waited);
    }
}
