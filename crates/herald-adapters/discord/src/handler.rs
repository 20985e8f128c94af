//! Serenity event handler bridging Discord events to the Herald event sink.

use std::sync::OnceLock;

use async_trait::async_trait;
use herald_core::{BoxedEventSink, MessageEvent, UserId};
use parking_lot::Mutex;
use serenity::all::{ActivityData, Context, EventHandler, Message, Ready};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Forwards `READY` to the waiting `connect` call and every message to the
/// sink.
pub(crate) struct DiscordHandler {
    sink: BoxedEventSink,
    self_id: OnceLock<UserId>,
    ready_tx: Mutex<Option<oneshot::Sender<UserId>>>,
    activity: Option<ActivityData>,
}

impl DiscordHandler {
    pub(crate) fn new(
        sink: BoxedEventSink,
        ready_tx: oneshot::Sender<UserId>,
        listening_to: Option<&str>,
    ) -> Self {
        Self {
            sink,
            self_id: OnceLock::new(),
            ready_tx: Mutex::new(Some(ready_tx)),
            activity: listening_to.map(ActivityData::listening),
        }
    }

    /// Records the bot identity and wakes `connect`. Later `READY` events
    /// (after a session resume) keep the first identity.
    fn on_ready(&self, self_id: UserId) {
        let _ = self.self_id.set(self_id.clone());
        let ready_tx = self.ready_tx.lock().take();
        if let Some(tx) = ready_tx {
            let _ = tx.send(self_id);
        }
    }

    /// Builds the core event for a received message, or `None` before the
    /// bot identity is known.
    fn to_event(&self, author_id: u64, channel_id: u64, content: String) -> Option<MessageEvent> {
        let self_id = self.self_id.get()?;
        Some(MessageEvent::received(
            author_id, channel_id, content, self_id,
        ))
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let self_id = UserId::from(ready.user.id.get());
        info!(
            user = %ready.user.name,
            id = %self_id,
            guilds = ready.guilds.len(),
            "Discord session ready"
        );
        if let Some(activity) = &self.activity {
            debug!(activity = %activity.name, "Setting presence");
            ctx.set_activity(Some(activity.clone()));
        }
        self.on_ready(self_id);
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let Some(event) = self.to_event(msg.author.id.get(), msg.channel_id.get(), msg.content)
        else {
            debug!("Dropping message received before READY");
            return;
        };
        self.sink.on_message(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::EventSink;
    use serenity::all::ActivityType;
    use std::sync::Arc;

    struct Discard;

    #[async_trait]
    impl EventSink for Discard {
        async fn on_message(&self, _event: MessageEvent) {}
    }

    #[tokio::test]
    async fn test_ready_resolves_identity_once() {
        let (tx, rx) = oneshot::channel();
        let handler = DiscordHandler::new(Arc::new(Discard), tx, None);

        assert!(handler.to_event(7, 9, "!ping".into()).is_none());

        handler.on_ready(UserId::from(42u64));
        handler.on_ready(UserId::from(43u64));
        assert_eq!(rx.await.unwrap(), UserId::from(42u64));

        let own = handler.to_event(42, 9, "Pong!".into()).unwrap();
        assert!(own.is_self());
        assert_eq!(own.channel_id().as_str(), "9");

        let other = handler.to_event(7, 9, "!ping".into()).unwrap();
        assert!(!other.is_self());
        assert_eq!(other.author_id().as_str(), "7");
    }

    #[test]
    fn test_presence_advertises_help_trigger() {
        let (tx, _rx) = oneshot::channel();
        let handler = DiscordHandler::new(Arc::new(Discard), tx, Some("!help"));

        let activity = handler.activity.as_ref().unwrap();
        assert_eq!(activity.name, "!help");
        assert!(matches!(activity.kind, ActivityType::Listening));

        let (tx, _rx) = oneshot::channel();
        let quiet = DiscordHandler::new(Arc::new(Discard), tx, None);
        assert!(quiet.activity.is_none());
    }
}
