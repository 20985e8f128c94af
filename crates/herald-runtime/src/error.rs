//! Runtime error types.

use herald_core::{ConfigError, ConnectionError, SessionError};
use thiserror::Error;

/// Errors that end the process.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration or credentials are unusable. No connection was made.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway connection failed or was lost.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Shutdown signal handlers could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

impl From<SessionError> for RuntimeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Config(e) => Self::Config(e),
            SessionError::Connection(e) => Self::Connection(e),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
