//! Gateway connection lifecycle.
//!
//! ```text
//! Disconnected ──start──▶ Connecting ──▶ Connected ──stop──▶ Closing ──▶ Disconnected
//!                             │
//!                             └── error ──▶ Disconnected
//! ```
//!
//! [`ConnectionManager::start`] hands back a [`Session`]. The session is not
//! `Clone` and [`ConnectionManager::stop`] consumes it, so a started
//! connection is closed at most once.

use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{ConnectionError, ConnectionResult, SessionError};
use crate::event::UserId;
use crate::gateway::{Credentials, Gateway};
use crate::registry::CommandRegistry;

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No connection.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Receiving events.
    Connected,
    /// Close requested.
    Closing,
}

/// A live gateway session.
#[derive(Debug)]
pub struct Session {
    self_id: UserId,
    status: SessionStatus,
}

impl Session {
    /// The bot's own identity on the gateway.
    pub fn self_id(&self) -> &UserId {
        &self.self_id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }
}

/// Owns the gateway connection and wires it to the dispatcher.
pub struct ConnectionManager<G: Gateway> {
    gateway: Arc<G>,
    registry: Arc<CommandRegistry>,
}

impl<G: Gateway> ConnectionManager<G> {
    /// Creates a manager for `gateway` dispatching into `registry`.
    pub fn new(gateway: G, registry: Arc<CommandRegistry>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            registry,
        }
    }

    /// The registry events are dispatched against.
    ///
    /// Commands registered here after [`start`](Self::start) take effect for
    /// the next inbound message.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Validates `credentials` and opens the gateway connection.
    ///
    /// Invalid credentials fail with [`SessionError::Config`] before the
    /// gateway is touched. There is no retry.
    pub async fn start(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        credentials.validate()?;

        let gateway = self.gateway.name();
        debug!(gateway, status = ?SessionStatus::Connecting, "Connecting");

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&self.registry),
            self.gateway.clone(),
        ));

        match self.gateway.connect(credentials, dispatcher).await {
            Ok(self_id) => {
                let session = Session {
                    self_id,
                    status: SessionStatus::Connected,
                };
                info!(
                    gateway,
                    self_id = %session.self_id,
                    commands = ?self.registry.triggers(),
                    "Connected"
                );
                Ok(session)
            }
            Err(e) => {
                error!(gateway, error = %e, "Failed to connect");
                Err(e.into())
            }
        }
    }

    /// Waits until `shutdown` is cancelled or the connection drops.
    ///
    /// Returns `Ok(())` on shutdown and the gateway's reason if the
    /// connection ended on its own. Either way the session still has to be
    /// passed to [`stop`](Self::stop).
    pub async fn run_until_shutdown(
        &self,
        session: &mut Session,
        shutdown: CancellationToken,
    ) -> ConnectionResult<()> {
        if session.status != SessionStatus::Connected {
            return Err(ConnectionError::NotConnected);
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(gateway = self.gateway.name(), "Shutdown requested");
                Ok(())
            }
            reason = self.gateway.closed() => {
                warn!(gateway = self.gateway.name(), error = %reason, "Connection lost");
                Err(reason)
            }
        }
    }

    /// Closes the connection and ends the session.
    pub async fn stop(&self, mut session: Session) -> ConnectionResult<()> {
        session.status = SessionStatus::Closing;
        debug!(gateway = self.gateway.name(), status = ?session.status, "Closing");

        let result = self.gateway.close().await;
        session.status = SessionStatus::Disconnected;

        match &result {
            Ok(()) => info!(gateway = self.gateway.name(), "Disconnected"),
            Err(e) => warn!(gateway = self.gateway.name(), error = %e, "Close failed"),
        }
        result
    }

    /// Runs until shutdown, then stops, on every exit path.
    ///
    /// An error from the run phase takes precedence over one from closing.
    /// A panic in the run phase still closes the connection before it is
    /// resumed.
    pub async fn serve(
        &self,
        mut session: Session,
        shutdown: CancellationToken,
    ) -> ConnectionResult<()> {
        let run = AssertUnwindSafe(self.run_until_shutdown(&mut session, shutdown))
            .catch_unwind()
            .await;
        let stop = self.stop(session).await;
        match run {
            Ok(run) => run.and(stop),
            Err(panic) => {
                error!(gateway = self.gateway.name(), "Run phase panicked, connection closed");
                resume_unwind(panic)
            }
        }
    }
}

impl<G: Gateway> std::fmt::Debug for ConnectionManager<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("gateway", &self.gateway.name())
            .field("registry", &self.registry)
            .finish()
    }
}
