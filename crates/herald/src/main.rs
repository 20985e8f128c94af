//! Herald bot binary.
//!
//! Reads the bot token from `DISCORD_TOKEN` (or `gateway.token` in
//! `herald.toml`), answers `!ping` with `Pong!` plus any reply commands from
//! the config file, lists them under `!help`, and runs until Ctrl+C.

use anyhow::{Context, Result};
use herald::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let runtime = HeraldRuntime::builder()
        .command("!ping", "Replies with Pong!", reply("Pong!"))
        .build()
        .context("failed to load configuration")?;

    let gateway = DiscordGateway::new(
        DiscordConfig::default()
            .with_ready_timeout(runtime.config().gateway.ready_timeout())
            .with_listening_to(runtime.help_trigger()),
    );

    runtime.run(gateway).await?;

    info!("Bot stopped");
    Ok(())
}
