//! Process orchestration.
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder()
//!     .command("!ping", "Replies with Pong!", herald_core::reply("Pong!"))
//!     .build()?;
//! runtime.run(gateway).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use herald_core::{
    BoxedHandler, CommandHandler, CommandRegistry, ConfigError, ConfigResult, ConnectionManager,
    Credentials, Gateway, help, reply,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{ConfigLoader, HeraldConfig, TOKEN_ENV, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::signal::ShutdownSignals;

/// Printed to stdout once the gateway session is up.
pub const READY_MESSAGE: &str = "Bot is now running. Press Ctrl+C to exit.";

const HELP_DESCRIPTION: &str = "Lists the available commands";

/// A command supplied in code rather than in the config file.
struct BuiltinCommand {
    trigger: String,
    description: String,
    handler: BoxedHandler,
}

/// Loaded configuration plus the command registry, ready to run against a
/// gateway.
pub struct HeraldRuntime {
    config: HeraldConfig,
    registry: Arc<CommandRegistry>,
}

impl HeraldRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Validates the configuration, initializes logging and registers the
    /// help command and every configured reply command.
    pub fn from_config(config: HeraldConfig) -> ConfigResult<Self> {
        Self::assemble(config, Vec::new())
    }

    /// Registration order is help, then built-ins, then the config file, so
    /// a configured trigger overrides a built-in one.
    fn assemble(config: HeraldConfig, builtins: Vec<BuiltinCommand>) -> ConfigResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let registry = Arc::new(CommandRegistry::new());
        if config.help.enabled {
            registry.register_described(
                config.help.trigger.clone(),
                HELP_DESCRIPTION,
                help(&registry),
            );
        }
        for builtin in builtins {
            registry.register_boxed(builtin.trigger, builtin.handler, Some(builtin.description));
        }
        for command in &config.commands {
            registry.register_described(
                command.trigger.clone(),
                command.description.clone(),
                reply(command.reply.clone()),
            );
        }

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            commands = registry.len(),
            "Runtime initialized from configuration"
        );

        Ok(Self { config, registry })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// The help trigger, if the help command is enabled.
    pub fn help_trigger(&self) -> Option<&str> {
        self.config
            .help
            .enabled
            .then_some(self.config.help.trigger.as_str())
    }

    /// The command registry. Handlers may be added at any time.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Builds gateway credentials from the configured token.
    ///
    /// Fails with [`ConfigError::MissingCredential`] if no token is set and
    /// [`ConfigError::EmptyCredential`] if it is blank.
    pub fn credentials(&self) -> ConfigResult<Credentials> {
        let token = self
            .config
            .gateway
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingCredential {
                origin: TOKEN_ENV.to_string(),
            })?;

        let credentials = Credentials::new(token).with_origin(TOKEN_ENV);
        credentials.validate()?;
        Ok(credentials)
    }

    /// Runs against `gateway` until Ctrl+C or SIGTERM.
    pub async fn run<G: Gateway>(&self, gateway: G) -> RuntimeResult<()> {
        // Fail on a bad token before touching signal handlers or the network.
        self.credentials()?;

        let shutdown = CancellationToken::new();
        let listener = ShutdownSignals::register()?.cancel_on_signal(shutdown.clone());

        let result = self.run_until(gateway, shutdown.clone()).await;

        shutdown.cancel();
        let _ = listener.await;
        result
    }

    /// Runs against `gateway` until `shutdown` is cancelled or the connection
    /// is lost.
    pub async fn run_until<G: Gateway>(
        &self,
        gateway: G,
        shutdown: CancellationToken,
    ) -> RuntimeResult<()> {
        let credentials = self.credentials()?;
        let manager = ConnectionManager::new(gateway, Arc::clone(&self.registry));

        let session = manager.start(&credentials).await?;
        debug!(self_id = %session.self_id(), "Session started");

        println!("{READY_MESSAGE}");
        info!("{READY_MESSAGE}");

        manager.serve(session, shutdown).await?;
        Ok(())
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`HeraldRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    builtins: Vec<BuiltinCommand>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            builtins: Vec::new(),
        }
    }

    /// Adds a built-in command. A `[[commands]]` entry with the same trigger
    /// replaces it.
    pub fn command<H>(
        mut self,
        trigger: impl Into<String>,
        description: impl Into<String>,
        handler: H,
    ) -> Self
    where
        H: CommandHandler,
    {
        self.builtins.push(BuiltinCommand {
            trigger: trigger.into(),
            description: description.into(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically, beneath files and environment.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> ConfigResult<HeraldRuntime> {
        let config = self.config_loader.load()?;
        HeraldRuntime::assemble(config, self.builtins)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplyCommand;
    use crate::error::RuntimeError;
    use herald_core::{
        BoxedEventSink, ChannelId, ConnectionError, ConnectionResult, MessageEvent, Outbound,
        SendResult, UserId,
    };

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        closes: AtomicUsize,
        sink: Mutex<Option<BoxedEventSink>>,
        sent: Mutex<Vec<String>>,
    }

    /// Gateway double sharing its counters with the test.
    struct CountingGateway(Arc<Counters>);

    #[async_trait]
    impl Outbound for CountingGateway {
        async fn send(&self, _channel: &ChannelId, text: &str) -> SendResult<()> {
            self.0.sent.lock().push(text.to_owned());
            Ok(())
        }
    }

    #[async_trait]
    impl Gateway for CountingGateway {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn connect(
            &self,
            _credentials: &Credentials,
            sink: BoxedEventSink,
        ) -> ConnectionResult<UserId> {
            self.0.connects.fetch_add(1, Ordering::SeqCst);
            *self.0.sink.lock() = Some(sink);
            Ok(UserId::from(1u64))
        }

        async fn closed(&self) -> ConnectionError {
            std::future::pending().await
        }

        async fn close(&self) -> ConnectionResult<()> {
            self.0.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config_with_token(token: Option<&str>) -> HeraldConfig {
        let mut config = HeraldConfig::default();
        config.gateway.token = token.map(str::to_string);
        config.commands.push(ReplyCommand {
            trigger: "!about".to_string(),
            reply: "Herald, a chat bot".to_string(),
            description: "What this bot is".to_string(),
        });
        config
    }

    #[test]
    fn test_configured_commands_are_registered() {
        let runtime = HeraldRuntime::from_config(config_with_token(None)).unwrap();
        assert_eq!(
            runtime.registry().triggers(),
            vec!["!about".to_string(), "!help".to_string()]
        );
        assert_eq!(runtime.help_trigger(), Some("!help"));
    }

    #[test]
    fn test_from_config_rejects_invalid_commands() {
        let mut config = config_with_token(None);
        config.commands[0].trigger = String::new();

        assert!(matches!(
            HeraldRuntime::from_config(config),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_disabled_help_is_not_registered() {
        let mut config = config_with_token(None);
        config.help.enabled = false;

        let runtime = HeraldRuntime::from_config(config).unwrap();
        assert_eq!(runtime.registry().triggers(), vec!["!about".to_string()]);
        assert_eq!(runtime.help_trigger(), None);
    }

    #[test]
    fn test_configured_command_overrides_builtin() {
        let mut config = config_with_token(None);
        config.commands.push(ReplyCommand {
            trigger: "!ping".to_string(),
            reply: "Pong from config".to_string(),
            description: "Configured ping".to_string(),
        });

        let runtime = RuntimeBuilder::new()
            .without_env()
            .search_path("/definitely/not/here")
            .merge(config)
            .command("!ping", "Replies with Pong!", reply("Pong!"))
            .build()
            .unwrap();

        let ping = runtime
            .registry()
            .commands()
            .into_iter()
            .find(|c| c.trigger == "!ping")
            .unwrap();
        assert_eq!(ping.description.as_deref(), Some("Configured ping"));
    }

    #[test]
    fn test_credentials_missing_and_empty() {
        let runtime = HeraldRuntime::from_config(config_with_token(None)).unwrap();
        assert!(matches!(
            runtime.credentials(),
            Err(ConfigError::MissingCredential { ref origin }) if origin == "DISCORD_TOKEN"
        ));

        let runtime = HeraldRuntime::from_config(config_with_token(Some("  "))).unwrap();
        assert!(matches!(
            runtime.credentials(),
            Err(ConfigError::EmptyCredential { .. })
        ));

        let runtime = HeraldRuntime::from_config(config_with_token(Some("Bot abc"))).unwrap();
        assert_eq!(runtime.credentials().unwrap().token(), "abc");
    }

    #[tokio::test]
    async fn test_missing_token_never_connects() {
        let counters = Arc::new(Counters::default());
        let runtime = HeraldRuntime::from_config(config_with_token(None)).unwrap();

        let err = runtime
            .run_until(CountingGateway(counters.clone()), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeError::Config(_)));
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_until_serves_commands_and_closes_once() {
        let counters = Arc::new(Counters::default());
        let runtime = HeraldRuntime::from_config(config_with_token(Some("token"))).unwrap();
        runtime.registry().register("!ping", reply("Pong!"));
        let shutdown = CancellationToken::new();

        let run = tokio::spawn({
            let counters = counters.clone();
            let shutdown = shutdown.clone();
            async move {
                runtime
                    .run_until(CountingGateway(counters), shutdown)
                    .await
            }
        });

        while counters.sink.lock().is_none() {
            tokio::task::yield_now().await;
        }
        let sink = counters.sink.lock().clone().unwrap();
        sink.on_message(MessageEvent::new("7", "42", "!ping", false))
            .await;
        sink.on_message(MessageEvent::new("7", "42", "!about", false))
            .await;
        sink.on_message(MessageEvent::new("7", "42", "!help", false))
            .await;

        shutdown.cancel();
        run.await.unwrap().unwrap();

        assert_eq!(
            *counters.sent.lock(),
            vec![
                "Pong!".to_string(),
                "Herald, a chat bot".to_string(),
                "Available commands:\n\
                 `!about` - What this bot is\n\
                 `!help` - Lists the available commands\n\
                 `!ping`"
                    .to_string(),
            ]
        );
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }
}
