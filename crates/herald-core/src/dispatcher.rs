//! Event dispatcher.
//!
//! The [`Dispatcher`] makes one decision per inbound message:
//!
//! 1. Messages the bot sent itself are dropped (prevents reply loops when the
//!    gateway echoes our own messages back).
//! 2. The content is looked up in the [`CommandRegistry`].
//! 3. On a match, exactly one handler runs with a [`Sender`] bound to the
//!    event's channel. There is no fallback handler.
//! 4. Anything else is dropped silently.
//!
//! A handler that returns an error or panics is logged and contained here;
//! it never reaches the gateway or affects other events.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{Instrument, debug, debug_span, error, trace};

use crate::error::HandlerError;
use crate::event::MessageEvent;
use crate::gateway::EventSink;
use crate::registry::CommandRegistry;
use crate::sender::{BoxedOutbound, Sender};

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The bot sent the message itself.
    Ignored,
    /// No trigger matched the content.
    Unmatched,
    /// A handler ran and succeeded.
    Handled,
    /// A handler ran and failed; the failure was logged.
    Failed,
}

/// Routes inbound messages to registered commands.
///
/// `Dispatcher` is `Send + Sync` and is shared with the gateway adapter as
/// its [`EventSink`].
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    outbound: BoxedOutbound,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`, replying through `outbound`.
    pub fn new(registry: Arc<CommandRegistry>, outbound: BoxedOutbound) -> Self {
        Self { registry, outbound }
    }

    /// The registry consulted for each event.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Dispatches a single event.
    pub async fn dispatch(&self, event: MessageEvent) -> Dispatch {
        if event.is_self() {
            trace!(channel = %event.channel_id(), "Ignoring own message");
            return Dispatch::Ignored;
        }

        let Some(handler) = self.registry.lookup(event.content()) else {
            trace!(channel = %event.channel_id(), "No command matched");
            return Dispatch::Unmatched;
        };

        let span = debug_span!(
            "dispatch",
            trigger = %event.content(),
            channel = %event.channel_id(),
            author = %event.author_id(),
        );
        let sender = Sender::new(Arc::clone(&self.outbound), event.channel_id().clone());

        let outcome = AssertUnwindSafe(async move { handler.call(event, sender).await })
            .catch_unwind()
            .instrument(span.clone())
            .await
            .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(&*panic))));

        let _enter = span.enter();
        match outcome {
            Ok(()) => {
                debug!("Command handled");
                Dispatch::Handled
            }
            Err(e) => {
                error!(error = %e, "Command handler failed");
                Dispatch::Failed
            }
        }
    }
}

#[async_trait]
impl EventSink for Dispatcher {
    async fn on_message(&self, event: MessageEvent) {
        self.dispatch(event).await;
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("command_count", &self.registry.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HandlerResult, SendResult};
    use crate::event::ChannelId;
    use crate::handler::reply;
    use crate::sender::Outbound;

    use parking_lot::Mutex;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log lines for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        /// Installs a thread-local subscriber writing `error` lines here.
        fn capture() -> (Self, DefaultGuard) {
            let buffer = Self::default();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(buffer.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::ERROR)
                .finish();
            let guard = tracing::subscriber::set_default(subscriber);
            (buffer, guard)
        }

        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Records every send instead of delivering it.
    #[derive(Default)]
    struct RecordingOutbound {
        sent: Mutex<Vec<(ChannelId, String)>>,
    }

    impl RecordingOutbound {
        fn sent(&self) -> Vec<(ChannelId, String)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Outbound for RecordingOutbound {
        async fn send(&self, channel: &ChannelId, text: &str) -> SendResult<()> {
            self.sent.lock().push((channel.clone(), text.to_owned()));
            Ok(())
        }
    }

    fn setup() -> (Dispatcher, Arc<RecordingOutbound>) {
        let outbound = Arc::new(RecordingOutbound::default());
        let registry = Arc::new(CommandRegistry::new().with("!ping", reply("Pong!")));
        let dispatcher = Dispatcher::new(registry, outbound.clone());
        (dispatcher, outbound)
    }

    async fn refuse(_event: MessageEvent, _sender: Sender) -> HandlerResult {
        Err(HandlerError::custom("database on fire"))
    }

    async fn explode(_event: MessageEvent, _sender: Sender) -> HandlerResult {
        panic!("boom")
    }

    fn message(content: &str, is_self: bool) -> MessageEvent {
        MessageEvent::new("author-1", "channel-9", content, is_self)
    }

    #[tokio::test]
    async fn test_ping_sends_exactly_one_pong() {
        let (dispatcher, outbound) = setup();

        let outcome = dispatcher.dispatch(message("!ping", false)).await;

        assert_eq!(outcome, Dispatch::Handled);
        assert_eq!(
            outbound.sent(),
            vec![(ChannelId::from("channel-9"), "Pong!".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unmatched_content_sends_nothing() {
        let (dispatcher, outbound) = setup();

        let outcome = dispatcher.dispatch(message("!pong", false)).await;

        assert_eq!(outcome, Dispatch::Unmatched);
        assert!(outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_messages_never_reach_handlers() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (dispatcher, outbound) = setup();

        let c = Arc::clone(&counter);
        dispatcher
            .registry()
            .register("Pong!", move |_event: MessageEvent, sender: Sender| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    sender.send("Pong!").await?;
                    HandlerResult::Ok(())
                }
            });

        for content in ["!ping", "Pong!", "anything"] {
            let outcome = dispatcher.dispatch(message(content, true)).await;
            assert_eq!(outcome, Dispatch::Ignored);
        }

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failing_handler_is_contained() {
        let (logs, _guard) = LogBuffer::capture();
        let (dispatcher, outbound) = setup();
        dispatcher.registry().register("!fail", refuse);

        assert_eq!(
            dispatcher.dispatch(message("!fail", false)).await,
            Dispatch::Failed
        );
        assert_eq!(
            dispatcher.dispatch(message("!ping", false)).await,
            Dispatch::Handled
        );
        assert_eq!(outbound.sent().len(), 1);

        let logs = logs.contents();
        assert!(logs.contains("Command handler failed"), "{logs}");
        assert!(logs.contains("database on fire"), "{logs}");
        assert_eq!(logs.matches("ERROR").count(), 1, "{logs}");
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let (logs, _guard) = LogBuffer::capture();
        let (dispatcher, outbound) = setup();
        dispatcher.registry().register("!boom", explode);

        assert_eq!(
            dispatcher.dispatch(message("!boom", false)).await,
            Dispatch::Failed
        );
        assert_eq!(
            dispatcher.dispatch(message("!ping", false)).await,
            Dispatch::Handled
        );
        assert_eq!(outbound.sent().len(), 1);

        let logs = logs.contents();
        assert!(logs.contains("handler panicked: boom"), "{logs}");
    }

    #[tokio::test]
    async fn test_reply_goes_to_event_channel() {
        let (dispatcher, outbound) = setup();

        dispatcher
            .dispatch(MessageEvent::new("a", "first", "!ping", false))
            .await;
        dispatcher
            .dispatch(MessageEvent::new("b", "second", "!ping", false))
            .await;

        let channels: Vec<String> = outbound
            .sent()
            .into_iter()
            .map(|(channel, _)| channel.to_string())
            .collect();
        assert_eq!(channels, vec!["first", "second"]);
    }
}
