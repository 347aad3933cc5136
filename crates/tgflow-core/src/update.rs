//! Update events and the capabilities the processor needs from them
//!
//! The processor is generic over two capability sets:
//! - [`BotIdentity`]: the process-wide bot and the client it talks through
//! - [`UpdateContext`]: an update with slots the processor fills before the
//!   pipeline runs
//!
//! [`Update`] is the stock implementation of [`UpdateContext`].

use crate::completion::{completion, CompletionHandle, CompletionReceiver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Result of one pipeline pass over an update
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum Outcome {
    /// No stage claimed the update
    #[default]
    Unhandled,
    /// A stage handled the update
    Handled,
    /// The pipeline recorded a failure for the caller
    Failed(String),
}

impl Outcome {
    /// Whether the pipeline has not yet decided anything about the update
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Outcome::Unhandled)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unhandled => write!(f, "unhandled"),
            Self::Handled => write!(f, "handled"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// The active bot, shared read-only by every update
pub trait BotIdentity: Send + Sync + 'static {
    /// Client used to reach the bot API
    type Client: Clone + Send + Sync + 'static;

    /// The client this bot talks through
    fn client(&self) -> &Self::Client;

    /// Human-readable name, used in logs
    fn name(&self) -> &str;
}

/// Mutable slots the processor fills on each update
pub trait UpdateContext: Send + 'static {
    /// Identity that handles this update
    type Bot: BotIdentity;
    /// Per-update resource bundle produced by a scope
    type Resources: Send + Sync + 'static;

    /// Correlation id used in logs
    fn id(&self) -> Uuid;

    /// Attach the resources of the scope acquired for this update
    fn set_resources(&mut self, resources: Arc<Self::Resources>);

    /// Attach the calling identity
    fn set_bot(&mut self, bot: Arc<Self::Bot>);

    /// Attach the client used during processing
    fn set_client(&mut self, client: <Self::Bot as BotIdentity>::Client);

    /// Detach the completion handle, if any
    fn take_completion(&mut self) -> Option<CompletionHandle>;

    /// Current outcome
    fn outcome(&self) -> &Outcome;

    /// Record an outcome
    fn set_outcome(&mut self, outcome: Outcome);
}

/// A unit of inbound work carrying an opaque payload
pub struct Update<T, B: BotIdentity, R> {
    id: Uuid,
    received_at: DateTime<Utc>,
    payload: T,
    resources: Option<Arc<R>>,
    bot: Option<Arc<B>>,
    client: Option<B::Client>,
    completion: Option<CompletionHandle>,
    outcome: Outcome,
}

impl<T, B: BotIdentity, R> Update<T, B, R> {
    /// Wrap a payload in a fresh update
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            payload,
            resources: None,
            bot: None,
            client: None,
            completion: None,
            outcome: Outcome::default(),
        }
    }

    /// Wrap a payload and return the receiver that resolves once it is processed
    #[must_use]
    pub fn awaitable(payload: T) -> (Self, CompletionReceiver) {
        let (handle, rx) = completion();
        (Self::new(payload).with_completion(handle), rx)
    }

    /// Attach a completion handle
    #[must_use]
    pub fn with_completion(mut self, handle: CompletionHandle) -> Self {
        self.completion = Some(handle);
        self
    }

    /// When the update was created
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// The payload
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Per-update resources (set once the processor picked the update up)
    pub fn resources(&self) -> Option<&Arc<R>> {
        self.resources.as_ref()
    }

    /// Calling identity
    pub fn bot(&self) -> Option<&Arc<B>> {
        self.bot.as_ref()
    }

    /// Bot API client
    pub fn client(&self) -> Option<&B::Client> {
        self.client.as_ref()
    }

    /// Whether a completion handle is still attached
    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }
}

impl<T, B, R> UpdateContext for Update<T, B, R>
where
    T: Send + 'static,
    B: BotIdentity,
    R: Send + Sync + 'static,
{
    type Bot = B;
    type Resources = R;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_resources(&mut self, resources: Arc<R>) {
        self.resources = Some(resources);
    }

    fn set_bot(&mut self, bot: Arc<B>) {
        self.bot = Some(bot);
    }

    fn set_client(&mut self, client: B::Client) {
        self.client = Some(client);
    }

    fn take_completion(&mut self) -> Option<CompletionHandle> {
        self.completion.take()
    }

    fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }
}

impl<T: fmt::Debug, B: BotIdentity, R> fmt::Debug for Update<T, B, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("id", &self.id)
            .field("received_at", &self.received_at)
            .field("payload", &self.payload)
            .field("has_resources", &self.resources.is_some())
            .field("bot", &self.bot.as_ref().map(|b| b.name().to_string()))
            .field("has_completion", &self.completion.is_some())
            .field("outcome", &self.outcome)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoBot {
        client: String,
    }

    impl BotIdentity for EchoBot {
        type Client = String;

        fn client(&self) -> &String {
            &self.client
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_new_update_is_unpopulated() {
        let update: Update<&str, EchoBot, ()> = Update::new("hello");
        assert_eq!(*update.payload(), "hello");
        assert!(update.resources().is_none());
        assert!(update.bot().is_none());
        assert!(update.client().is_none());
        assert!(!update.has_completion());
        assert!(update.outcome().is_unhandled());
    }

    #[test]
    fn test_slots_are_populated() {
        let bot = Arc::new(EchoBot {
            client: "client-1".to_string(),
        });
        let mut update: Update<u32, EchoBot, Vec<u8>> = Update::new(7);

        update.set_resources(Arc::new(vec![1, 2, 3]));
        update.set_client(bot.client().clone());
        update.set_bot(bot);

        assert_eq!(update.resources().unwrap().len(), 3);
        assert_eq!(update.client().unwrap(), "client-1");
        assert_eq!(update.bot().unwrap().name(), "echo");
    }

    #[test]
    fn test_take_completion_only_once() {
        let (mut update, _rx) = Update::<(), EchoBot, ()>::awaitable(());
        assert!(update.take_completion().is_some());
        assert!(update.take_completion().is_none());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&Outcome::Failed("nope".to_string())).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"nope"}"#);

        let outcome: Outcome = serde_json::from_str(r#"{"status":"handled"}"#).unwrap();
        assert_eq!(outcome, Outcome::Handled);
    }
}
