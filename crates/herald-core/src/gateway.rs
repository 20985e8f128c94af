//! Gateway adapter boundary.
//!
//! The wire protocol and authentication handshake live behind the
//! [`Gateway`] trait. An adapter provides:
//!
//! - a `connect` / `close` lifecycle pair,
//! - delivery of every inbound message to an [`EventSink`],
//! - the [`Outbound`] send primitive.
//!
//! ```text
//! Gateway ──MessageEvent──▶ EventSink (Dispatcher) ──▶ CommandHandler
//!    ▲                                                      │
//!    └──────────────── Outbound::send ◀──── Sender ◀────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ConfigError, ConfigResult, ConnectionResult};
use crate::event::{MessageEvent, UserId};
use crate::sender::Outbound;

/// Receives inbound message events from a gateway.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Called once for every inbound message, possibly concurrently.
    async fn on_message(&self, event: MessageEvent);
}

/// A boxed event sink trait object.
pub type BoxedEventSink = Arc<dyn EventSink>;

/// A messaging gateway connection.
#[async_trait]
pub trait Gateway: Outbound + 'static {
    /// Short name used in logs (e.g. `"discord"`).
    fn name(&self) -> &'static str;

    /// Opens the connection and starts delivering events to `sink`.
    ///
    /// Returns the bot's own identity once the handshake has completed.
    async fn connect(
        &self,
        credentials: &Credentials,
        sink: BoxedEventSink,
    ) -> ConnectionResult<UserId>;

    /// Resolves if the connection ends without [`close`](Self::close) being
    /// called, yielding the reason.
    async fn closed(&self) -> crate::ConnectionError;

    /// Closes the connection.
    async fn close(&self) -> ConnectionResult<()>;
}

/// Authentication token for a gateway.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    origin: String,
}

impl Credentials {
    /// Wraps a raw token.
    ///
    /// Surrounding whitespace and a leading `Bot ` scheme are stripped; the
    /// gateway library adds the scheme itself.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let trimmed = token.trim_start();
        let trimmed = trimmed.strip_prefix("Bot ").unwrap_or(trimmed).trim();
        Self {
            token: trimmed.to_owned(),
            origin: "token".to_owned(),
        }
    }

    /// Records where the token came from, for error messages.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Where the token came from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Fails with [`ConfigError::EmptyCredential`] if the token is empty.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.token.is_empty() {
            return Err(ConfigError::EmptyCredential {
                origin: self.origin.clone(),
            });
        }
        Ok(())
    }

    /// The normalized token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_normalize_scheme_and_whitespace() {
        assert_eq!(Credentials::new("  abc.def  ").token(), "abc.def");
        assert_eq!(Credentials::new("Bot abc.def").token(), "abc.def");
    }

    #[test]
    fn test_empty_credentials_fail_validation() {
        for raw in ["", "   ", "Bot ", "Bot   "] {
            let err = Credentials::new(raw)
                .with_origin("DISCORD_TOKEN")
                .validate()
                .unwrap_err();
            assert!(matches!(err, ConfigError::EmptyCredential { ref origin } if origin == "DISCORD_TOKEN"));
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", Credentials::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
