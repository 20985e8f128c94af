//! # Herald Adapter for Discord
//!
//! Implements the Herald [`Gateway`](herald_core::Gateway) on top of
//! [serenity](https://docs.rs/serenity).
//!
//! - Connects with the `GUILD_MESSAGES`, `DIRECT_MESSAGES` and
//!   `MESSAGE_CONTENT` intents. The last one is privileged and must be
//!   enabled for the application in the Discord developer portal.
//! - Turns every `MESSAGE_CREATE` into a [`MessageEvent`](herald_core::MessageEvent)
//!   with decimal snowflake ids.
//! - Sends replies through `ChannelId::say`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald_adapter_discord::{DiscordConfig, DiscordGateway};
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder().build()?;
//! runtime.run(DiscordGateway::new(DiscordConfig::default())).await?;
//! ```

pub mod config;
pub mod gateway;
mod handler;

pub use config::DiscordConfig;
pub use gateway::{DiscordGateway, classify_error, intents, parse_channel_id};
