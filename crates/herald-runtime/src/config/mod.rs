//! Configuration module for the Herald runtime.
//!
//! Layered loading (defaults, files, environment, overrides) plus
//! validation of the resulting [`HeraldConfig`].

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, PROFILE_ENV, Profile, TOKEN_ENV, load_config};
pub use schema::{
    GatewayConfig, HelpConfig, HeraldConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, ReplyCommand,
    SpanEventConfig,
};
pub use validation::validate_config;
