//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Gateway connection settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Built-in command listing.
    #[serde(default)]
    pub help: HelpConfig,

    /// Fixed-text reply commands registered at startup.
    #[serde(default)]
    pub commands: Vec<ReplyCommand>,
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bot token. Usually supplied through `DISCORD_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,

    /// How long to wait for the gateway handshake.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

impl GatewayConfig {
    /// The handshake timeout as a [`Duration`].
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            token: None,
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ready_timeout_secs", &self.ready_timeout_secs)
            .finish()
    }
}

fn default_ready_timeout_secs() -> u64 {
    30
}

// =============================================================================
// Commands
// =============================================================================

/// A command that answers `trigger` with a fixed `reply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyCommand {
    /// Exact message content that fires the command.
    pub trigger: String,
    /// Text sent back to the channel.
    pub reply: String,
    /// Shown next to the trigger in the help listing. Required.
    #[serde(default)]
    pub description: String,
}

/// The built-in help command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpConfig {
    /// Register the help command at all.
    pub enabled: bool,
    /// Trigger that lists the commands. Also advertised in the bot's
    /// Discord presence.
    pub trigger: String,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger: "!help".to_string(),
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides, e.g. `serenity = "warn"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Which span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            filters: HashMap::from([("serenity".to_string(), LogLevel::Warn)]),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
        }
    }
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase level name as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a [`tracing::Level`].
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard error, keeping stdout for the ready banner.
    #[default]
    Stderr,
    Stdout,
    File,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
