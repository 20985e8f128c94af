//! Shutdown signal handling.
//!
//! Ctrl+C (SIGINT) and, on Unix, SIGTERM cancel a [`CancellationToken`] that
//! the connection manager waits on.

use std::io;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Installed process signal handlers.
pub struct ShutdownSignals {
    #[cfg(unix)]
    sigterm: signal::unix::Signal,
}

impl ShutdownSignals {
    /// Installs the handlers. Must be called from within a Tokio runtime.
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            sigterm: signal::unix::signal(signal::unix::SignalKind::terminate())?,
        })
    }

    /// Waits for Ctrl+C or SIGTERM.
    pub async fn recv(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            tokio::select! {
                res = signal::ctrl_c() => {
                    res?;
                    info!("Received Ctrl+C, shutting down");
                }
                _ = self.sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
            info!("Received Ctrl+C, shutting down");
        }

        Ok(())
    }

    /// Spawns a task that cancels `shutdown` on the first signal.
    ///
    /// The task also ends when `shutdown` is cancelled by someone else.
    pub fn cancel_on_signal(mut self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                res = self.recv() => match res {
                    Ok(()) => shutdown.cancel(),
                    Err(e) => error!(error = %e, "Failed to listen for shutdown signals"),
                },
                _ = shutdown.cancelled() => {}
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_exits_when_token_cancelled_elsewhere() {
        let shutdown = CancellationToken::new();
        let listener = ShutdownSignals::register()
            .unwrap()
            .cancel_on_signal(shutdown.clone());

        shutdown.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), listener)
            .await
            .expect("listener should stop")
            .unwrap();
    }
}
