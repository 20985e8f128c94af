//! Unified error types for the Herald core.
//!
//! Configuration and connection errors are fatal to the process. Handler
//! errors are recovered at the dispatch boundary and only logged.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised before any connection attempt is made.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No credential was configured at all.
    #[error("missing credential: no token found in {origin}")]
    MissingCredential {
        /// Where the token was expected to come from.
        origin: String,
    },

    /// A credential was configured but is empty.
    #[error("credential from {origin} is empty")]
    EmptyCredential {
        /// Where the token came from.
        origin: String,
    },

    /// A configuration file was requested explicitly but does not exist.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Configuration sources could not be parsed or merged.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration value is out of range or malformed.
    #[error("invalid configuration: {message}")]
    Validation {
        /// What is wrong with the value.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// =============================================================================
// Connection Errors
// =============================================================================

/// Errors establishing or holding the gateway session.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// The gateway could not be reached.
    #[error("gateway unreachable: {reason}")]
    Unreachable {
        /// Reason for failure.
        reason: String,
    },

    /// The gateway refused the handshake (bad token, missing intents, ...).
    #[error("gateway rejected the connection: {reason}")]
    Rejected {
        /// Reason for failure.
        reason: String,
    },

    /// The handshake did not complete in time.
    #[error("gateway handshake timed out after {secs}s")]
    Timeout {
        /// Seconds waited.
        secs: u64,
    },

    /// An established connection ended without being asked to.
    #[error("gateway connection closed: {reason}")]
    Closed {
        /// Reason for closure.
        reason: String,
    },

    /// An operation needed a live connection and there is none.
    #[error("gateway is not connected")]
    NotConnected,
}

// =============================================================================
// Send Errors
// =============================================================================

/// Errors from the outbound `send` primitive.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// The channel identifier is not valid for this gateway.
    #[error("invalid channel id '{0}'")]
    InvalidChannel(String),

    /// The gateway has no live connection.
    #[error("gateway is not connected")]
    NotConnected,

    /// The gateway accepted the request but delivery failed.
    #[error("failed to send message: {0}")]
    Failed(String),
}

// =============================================================================
// Handler Errors
// =============================================================================

/// A command handler failed.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// Sending the reply failed.
    #[error(transparent)]
    Send(#[from] SendError),

    /// The handler reported a failure of its own.
    #[error("{0}")]
    Failed(String),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Creates a custom handler failure.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

// =============================================================================
// Session Errors
// =============================================================================

/// Errors returned by [`ConnectionManager::start`](crate::ConnectionManager::start).
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Credentials were unusable; no connection was attempted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway connection could not be established.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Result type for outbound sends.
pub type SendResult<T> = Result<T, SendError>;

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
