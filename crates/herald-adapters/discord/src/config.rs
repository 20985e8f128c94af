//! Configuration for the Discord adapter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Discord adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// How long `connect` waits for the `READY` event.
    pub ready_timeout_secs: u64,
    /// Shown as "Listening to ..." in the bot's presence.
    pub listening_to: Option<String>,
}

impl DiscordConfig {
    /// The handshake timeout as a [`Duration`].
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    /// Sets the handshake timeout.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Sets or clears the presence text.
    pub fn with_listening_to(mut self, text: Option<impl Into<String>>) -> Self {
        self.listening_to = text.map(Into::into);
        self
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: 30,
            listening_to: Some("!help".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_settings() {
        let config = DiscordConfig::default()
            .with_ready_timeout(Duration::from_millis(200))
            .with_listening_to(Some("!commands"));

        assert_eq!(config.ready_timeout_secs, 1);
        assert_eq!(config.listening_to.as_deref(), Some("!commands"));
        assert_eq!(
            DiscordConfig::default().listening_to.as_deref(),
            Some("!help")
        );
    }
}
