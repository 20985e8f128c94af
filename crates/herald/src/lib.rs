//! # Herald
//!
//! A chat bot that answers exact-match text commands.
//!
//! ```text
//! ┌──────────────┐ MessageEvent ┌────────────┐ lookup ┌─────────────────┐
//! │   Gateway    │─────────────▶│ Dispatcher │───────▶│ CommandRegistry │
//! │  (Discord)   │◀─────────────│            │        └─────────────────┘
//! └──────────────┘  Sender.send └────────────┘
//! ```
//!
//! - **Core** ([`core`]): events, registry, dispatcher, connection manager
//! - **Runtime** ([`runtime`]): configuration, logging, signals
//! - **Discord** ([`discord`]): the serenity-backed gateway
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder()
//!         .command("!ping", "Replies with Pong!", reply("Pong!"))
//!         .build()?;
//!     runtime.run(DiscordGateway::default()).await?;
//!     Ok(())
//! }
//! ```

pub use herald_adapter_discord as discord;
pub use herald_core as core;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use herald_adapter_discord::{DiscordConfig, DiscordGateway};
    pub use herald_core::{
        CommandRegistry, HandlerError, HandlerResult, MessageEvent, Sender, help, reply,
    };
    pub use herald_runtime::{HeraldConfig, HeraldRuntime};
}
