//! Discord implementation of the Herald [`Gateway`].
//!
//! One [`DiscordGateway`] drives one serenity [`Client`]. The client runs on
//! its own task; `connect` returns once Discord has sent `READY`, and
//! `close` shuts every shard down and waits for that task to finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use herald_core::{
    BoxedEventSink, ChannelId, ConnectionError, ConnectionResult, Credentials, Gateway, Outbound,
    SendError, SendResult, UserId,
};
use parking_lot::Mutex;
use serenity::Client;
use serenity::all::{GatewayIntents, Http, ShardManager};
use serenity::gateway::GatewayError;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::DiscordConfig;
use crate::handler::DiscordHandler;

/// Intents needed to read message content in guilds and DMs.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

type ClosedRx = watch::Receiver<Option<ConnectionError>>;

/// A live serenity client.
struct Connection {
    http: Arc<Http>,
    shard_manager: Arc<ShardManager>,
    task: JoinHandle<()>,
    closing: Arc<AtomicBool>,
    closed_rx: ClosedRx,
}

/// Discord gateway adapter.
#[derive(Default)]
pub struct DiscordGateway {
    config: DiscordConfig,
    connection: Mutex<Option<Connection>>,
}

impl DiscordGateway {
    /// Creates an unconnected gateway.
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
        }
    }

    /// Returns the adapter configuration.
    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }

    /// Whether a client is currently running.
    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    fn http(&self) -> SendResult<Arc<Http>> {
        self.connection
            .lock()
            .as_ref()
            .map(|c| Arc::clone(&c.http))
            .ok_or(SendError::NotConnected)
    }
}

#[async_trait]
impl Outbound for DiscordGateway {
    async fn send(&self, channel: &ChannelId, text: &str) -> SendResult<()> {
        let channel_id = parse_channel_id(channel)?;
        let http = self.http()?;

        trace!(channel = %channel, len = text.len(), "Sending Discord message");
        channel_id
            .say(&http, text)
            .await
            .map_err(|e| SendError::Failed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn connect(
        &self,
        credentials: &Credentials,
        sink: BoxedEventSink,
    ) -> ConnectionResult<UserId> {
        if self.is_connected() {
            return Err(ConnectionError::Rejected {
                reason: "a Discord client is already running on this gateway".into(),
            });
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let mut client = Client::builder(credentials.token(), intents())
            .event_handler(DiscordHandler::new(
                sink,
                ready_tx,
                self.config.listening_to.as_deref(),
            ))
            .await
            .map_err(classify_error)?;

        let http = Arc::clone(&client.http);
        let shard_manager = Arc::clone(&client.shard_manager);
        let closing = Arc::new(AtomicBool::new(false));
        let (closed_tx, closed_rx) = watch::channel(None);

        let task = {
            let closing = Arc::clone(&closing);
            tokio::spawn(async move {
                let reason = match client.start().await {
                    Ok(()) => ConnectionError::Closed {
                        reason: "Discord client stopped".into(),
                    },
                    Err(e) => classify_error(e),
                };
                if closing.load(Ordering::SeqCst) {
                    debug!("Discord client stopped after close");
                } else {
                    error!(error = %reason, "Discord client stopped unexpectedly");
                    let _ = closed_tx.send(Some(reason));
                }
            })
        };

        debug!(timeout_secs = self.config.ready_timeout_secs, "Waiting for READY");
        let mut startup_rx = closed_rx.clone();
        let ready = tokio::time::timeout(self.config.ready_timeout(), async {
            tokio::select! {
                ready = ready_rx => ready.map_err(|_| ConnectionError::Closed {
                    reason: "Discord client dropped before READY".into(),
                }),
                reason = wait_closed(&mut startup_rx) => Err(reason),
            }
        })
        .await
        .unwrap_or(Err(ConnectionError::Timeout {
            secs: self.config.ready_timeout_secs,
        }));

        match ready {
            Ok(self_id) => {
                info!(self_id = %self_id, "Connected to Discord");
                *self.connection.lock() = Some(Connection {
                    http,
                    shard_manager,
                    task,
                    closing,
                    closed_rx,
                });
                Ok(self_id)
            }
            Err(e) => {
                closing.store(true, Ordering::SeqCst);
                shard_manager.shutdown_all().await;
                task.abort();
                Err(e)
            }
        }
    }

    async fn closed(&self) -> ConnectionError {
        let closed_rx = self.connection.lock().as_ref().map(|c| c.closed_rx.clone());
        let Some(mut closed_rx) = closed_rx else {
            return ConnectionError::NotConnected;
        };
        wait_closed(&mut closed_rx).await
    }

    async fn close(&self) -> ConnectionResult<()> {
        let connection = self.connection.lock().take();
        let Some(connection) = connection else {
            return Err(ConnectionError::NotConnected);
        };

        connection.closing.store(true, Ordering::SeqCst);
        connection.shard_manager.shutdown_all().await;

        match connection.task.await {
            Ok(()) => {
                info!("Disconnected from Discord");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Discord client task failed during close");
                Err(ConnectionError::Closed {
                    reason: format!("client task failed: {e}"),
                })
            }
        }
    }
}

impl std::fmt::Debug for DiscordGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordGateway")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Waits until the client task publishes why it stopped.
///
/// Pending forever if the task ends without publishing, which only happens
/// after `close`.
async fn wait_closed(closed_rx: &mut ClosedRx) -> ConnectionError {
    let reason = match closed_rx.wait_for(Option::is_some).await {
        Ok(reason) => reason.clone(),
        Err(_) => None,
    };
    match reason {
        Some(reason) => reason,
        None => std::future::pending().await,
    }
}

/// Parses a decimal Discord snowflake.
pub fn parse_channel_id(channel: &ChannelId) -> SendResult<serenity::all::ChannelId> {
    match channel.as_str().parse::<u64>() {
        Ok(id) if id != 0 => Ok(serenity::all::ChannelId::new(id)),
        _ => Err(SendError::InvalidChannel(channel.to_string())),
    }
}

/// Maps a serenity error to a connection error.
///
/// Authentication and intent failures are rejections; everything else is
/// treated as the gateway being unreachable.
pub fn classify_error(err: serenity::Error) -> ConnectionError {
    match err {
        serenity::Error::Gateway(
            e @ (GatewayError::InvalidAuthentication
            | GatewayError::InvalidGatewayIntents
            | GatewayError::DisallowedGatewayIntents),
        ) => ConnectionError::Rejected {
            reason: e.to_string(),
        },
        other => ConnectionError::Unreachable {
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_id() {
        let id = parse_channel_id(&ChannelId::from(123456789012345678u64)).unwrap();
        assert_eq!(id.get(), 123456789012345678);

        for bad in ["", "0", "general", "-5", "12 34"] {
            assert!(matches!(
                parse_channel_id(&ChannelId::from(bad)),
                Err(SendError::InvalidChannel(_))
            ));
        }
    }

    #[test]
    fn test_classify_error() {
        let rejected = classify_error(serenity::Error::Gateway(
            GatewayError::InvalidAuthentication,
        ));
        assert!(matches!(rejected, ConnectionError::Rejected { .. }));

        let unreachable = classify_error(serenity::Error::Other("connection reset"));
        assert!(matches!(unreachable, ConnectionError::Unreachable { .. }));
    }

    #[test]
    fn test_intents_include_message_content() {
        assert!(intents().contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(intents().contains(GatewayIntents::GUILD_MESSAGES));
        assert!(intents().contains(GatewayIntents::DIRECT_MESSAGES));
    }

    #[tokio::test]
    async fn test_unconnected_gateway() {
        let gateway = DiscordGateway::new(DiscordConfig::default());

        assert!(matches!(
            gateway.send(&ChannelId::from(1u64), "hi").await,
            Err(SendError::NotConnected)
        ));
        assert!(matches!(
            gateway.closed().await,
            ConnectionError::NotConnected
        ));
        assert!(matches!(
            gateway.close().await,
            Err(ConnectionError::NotConnected)
        ));
    }
}
