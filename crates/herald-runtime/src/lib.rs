//! Herald Runtime: configuration, logging and process lifecycle.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `HeraldConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - Ctrl+C / SIGTERM handling (`ShutdownSignals`)
//! - Process orchestration (`HeraldRuntime`)
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder()
//!         .command("!ping", "Replies with Pong!", herald_core::reply("Pong!"))
//!         .build()?;
//!     runtime.run(my_gateway).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod signal;

pub use config::{ConfigLoader, HeraldConfig, Profile, load_config};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HeraldRuntime, READY_MESSAGE, RuntimeBuilder};
pub use signal::ShutdownSignals;

// Re-export tracing for use by other crates
pub use tracing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
