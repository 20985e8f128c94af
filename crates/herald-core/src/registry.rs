//! Command registry.
//!
//! Maps triggers to handlers. Matching is exact and case-sensitive: the
//! message content must equal the trigger byte for byte, with no trimming
//! and no prefix or substring matching.
//!
//! The registry is read on every inbound message and written rarely, usually
//! only before the connection starts. A [`RwLock`] keeps late registration
//! safe; lookups clone the handler out so no lock is held while it runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::handler::{BoxedHandler, CommandHandler};

/// A registered trigger and what it is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// Exact content that fires the command.
    pub trigger: String,
    /// Short text shown in the command listing.
    pub description: Option<String>,
}

struct Entry {
    handler: BoxedHandler,
    description: Option<String>,
}

/// Trigger to handler mapping.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Entry>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `trigger`, replacing any previous handler.
    pub fn register<H>(&self, trigger: impl Into<String>, handler: H)
    where
        H: CommandHandler,
    {
        self.register_boxed(trigger, Arc::new(handler), None);
    }

    /// Like [`register`](Self::register), with a description for the
    /// command listing.
    pub fn register_described<H>(
        &self,
        trigger: impl Into<String>,
        description: impl Into<String>,
        handler: H,
    ) where
        H: CommandHandler,
    {
        self.register_boxed(trigger, Arc::new(handler), Some(description.into()));
    }

    /// Registers an already type-erased handler.
    pub fn register_boxed(
        &self,
        trigger: impl Into<String>,
        handler: BoxedHandler,
        description: Option<String>,
    ) {
        let trigger = trigger.into();
        let entry = Entry {
            handler,
            description,
        };
        let replaced = self
            .commands
            .write()
            .insert(trigger.clone(), entry)
            .is_some();

        if replaced {
            warn!(trigger = %trigger, "Replaced existing command handler");
        } else {
            debug!(trigger = %trigger, "Registered command");
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<H>(self, trigger: impl Into<String>, handler: H) -> Self
    where
        H: CommandHandler,
    {
        self.register(trigger, handler);
        self
    }

    /// Removes the handler for `trigger`. Returns whether one was registered.
    pub fn unregister(&self, trigger: &str) -> bool {
        self.commands.write().remove(trigger).is_some()
    }

    /// Returns the handler whose trigger equals `content` exactly.
    pub fn lookup(&self, content: &str) -> Option<BoxedHandler> {
        self.commands
            .read()
            .get(content)
            .map(|entry| Arc::clone(&entry.handler))
    }

    /// Whether `trigger` has a handler.
    pub fn contains(&self, trigger: &str) -> bool {
        self.commands.read().contains_key(trigger)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }

    /// All registered triggers, sorted.
    pub fn triggers(&self) -> Vec<String> {
        let mut triggers: Vec<String> = self.commands.read().keys().cloned().collect();
        triggers.sort();
        triggers
    }

    /// Every command with its description, sorted by trigger.
    pub fn commands(&self) -> Vec<CommandInfo> {
        let mut commands: Vec<CommandInfo> = self
            .commands
            .read()
            .iter()
            .map(|(trigger, entry)| CommandInfo {
                trigger: trigger.clone(),
                description: entry.description.clone(),
            })
            .collect();
        commands.sort_by(|a, b| a.trigger.cmp(&b.trigger));
        commands
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("triggers", &self.triggers())
            .finish()
    }
}
