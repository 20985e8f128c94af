//! Herald Core: command dispatch for chat bots.
//!
//! This crate is gateway-agnostic. It knows nothing about Discord or any
//! other wire protocol; those live behind the [`Gateway`] trait.
//!
//! # Overview
//!
//! - [`MessageEvent`]: one inbound message, built by the gateway adapter.
//! - [`CommandRegistry`]: exact, case-sensitive trigger to handler mapping.
//! - [`Dispatcher`]: routes each event to at most one handler and contains
//!   handler failures.
//! - [`ConnectionManager`]: starts, runs and stops the gateway session.
//! - [`Sender`]: the send capability a handler gets, scoped to one channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use herald_core::{CommandRegistry, ConnectionManager, Credentials, reply};
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = Arc::new(CommandRegistry::new().with("!ping", reply("Pong!")));
//! let manager = ConnectionManager::new(gateway, registry);
//!
//! let session = manager.start(&Credentials::new(token)).await?;
//! manager.serve(session, CancellationToken::new()).await?;
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod gateway;
pub mod handler;
pub mod registry;
pub mod sender;

pub use connection::{ConnectionManager, Session, SessionStatus};
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{
    ConfigError, ConfigResult, ConnectionError, ConnectionResult, HandlerError, HandlerResult,
    SendError, SendResult, SessionError,
};
pub use event::{ChannelId, MessageEvent, UserId};
pub use gateway::{BoxedEventSink, Credentials, EventSink, Gateway};
pub use handler::{BoxFuture, BoxedHandler, CommandHandler, Help, Reply, help, reply};
pub use registry::{CommandInfo, CommandRegistry};
pub use sender::{BoxedOutbound, Outbound, Sender};
