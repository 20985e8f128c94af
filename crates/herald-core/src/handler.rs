//! Command handlers.
//!
//! A handler is anything implementing [`CommandHandler`]. Async closures of
//! the shape `Fn(MessageEvent, Sender) -> impl Future<Output = HandlerResult>`
//! get a blanket implementation, so most commands are plain functions:
//!
//! ```rust,ignore
//! use herald_core::{CommandRegistry, HandlerResult, MessageEvent, Sender};
//!
//! async fn whoami(event: MessageEvent, sender: Sender) -> HandlerResult {
//!     sender.send(format!("You are {}", event.author_id())).await?;
//!     Ok(())
//! }
//!
//! let registry = CommandRegistry::new();
//! registry.register("!whoami", whoami);
//! registry.register("!ping", herald_core::reply("Pong!"));
//! ```

use std::fmt::Write;
use std::future::Future;
use std::sync::{Arc, Weak};

pub use futures::future::BoxFuture;

use crate::error::{HandlerError, HandlerResult};
use crate::event::MessageEvent;
use crate::registry::{CommandInfo, CommandRegistry};
use crate::sender::Sender;

/// Logic bound to a trigger.
pub trait CommandHandler: Send + Sync + 'static {
    /// Runs the handler for `event`, replying through `sender`.
    fn call(&self, event: MessageEvent, sender: Sender) -> BoxFuture<'static, HandlerResult>;
}

/// A type-erased handler that can be stored in the registry.
pub type BoxedHandler = Arc<dyn CommandHandler>;

impl<F, Fut> CommandHandler for F
where
    F: Fn(MessageEvent, Sender) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, event: MessageEvent, sender: Sender) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(event, sender))
    }
}

/// Handler that answers every trigger with the same text.
#[derive(Debug, Clone)]
pub struct Reply {
    text: Arc<str>,
}

impl CommandHandler for Reply {
    fn call(&self, _event: MessageEvent, sender: Sender) -> BoxFuture<'static, HandlerResult> {
        let text = Arc::clone(&self.text);
        Box::pin(async move {
            sender.send(&*text).await?;
            Ok(())
        })
    }
}

/// Creates a handler that replies with `text` in the triggering channel.
pub fn reply(text: impl Into<String>) -> Reply {
    Reply {
        text: Arc::from(text.into()),
    }
}

/// Handler that lists every registered command with its description.
///
/// Holds the registry weakly since the registry owns the handler.
#[derive(Debug, Clone)]
pub struct Help {
    registry: Weak<CommandRegistry>,
}

impl CommandHandler for Help {
    fn call(&self, _event: MessageEvent, sender: Sender) -> BoxFuture<'static, HandlerResult> {
        let listing = self
            .registry
            .upgrade()
            .map(|registry| render_help(&registry.commands()));
        Box::pin(async move {
            let listing = listing.ok_or_else(|| HandlerError::custom("command registry dropped"))?;
            sender.send(listing).await?;
            Ok(())
        })
    }
}

/// Creates a handler that answers with the command listing of `registry`.
pub fn help(registry: &Arc<CommandRegistry>) -> Help {
    Help {
        registry: Arc::downgrade(registry),
    }
}

fn render_help(commands: &[CommandInfo]) -> String {
    let mut text = String::from("Available commands:");
    for command in commands {
        let _ = match &command.description {
            Some(description) => write!(text, "\n`{}` - {}", command.trigger, description),
            None => write!(text, "\n`{}`", command.trigger),
        };
    }
    text
}
