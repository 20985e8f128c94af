//! Inbound message events.
//!
//! A [`MessageEvent`] is built by the gateway adapter when a message arrives
//! and is read-only from then on. The core only consumes events.

use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from its gateway representation.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as the gateway rendered it.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(
    /// Opaque identifier of a user account (message author or the bot itself).
    UserId
);

opaque_id!(
    /// Opaque identifier of the channel a message was delivered to.
    ChannelId
);

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    author_id: UserId,
    channel_id: ChannelId,
    content: String,
    is_self: bool,
}

impl MessageEvent {
    /// Creates an event with an explicit self flag.
    pub fn new(
        author_id: impl Into<UserId>,
        channel_id: impl Into<ChannelId>,
        content: impl Into<String>,
        is_self: bool,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            channel_id: channel_id.into(),
            content: content.into(),
            is_self,
        }
    }

    /// Creates an event for a received message, deriving the self flag from
    /// the bot's own identity.
    pub fn received(
        author_id: impl Into<UserId>,
        channel_id: impl Into<ChannelId>,
        content: impl Into<String>,
        self_id: &UserId,
    ) -> Self {
        let author_id = author_id.into();
        let is_self = &author_id == self_id;
        Self::new(author_id, channel_id, content, is_self)
    }

    /// The sender of the message.
    pub fn author_id(&self) -> &UserId {
        &self.author_id
    }

    /// The channel the message was delivered to.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// The raw text body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the bot itself sent this message.
    pub fn is_self(&self) -> bool {
        self.is_self
    }
}
