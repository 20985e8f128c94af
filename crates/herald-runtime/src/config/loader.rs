//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic configuration passed to [`ConfigLoader::merge`]
//! 3. Profile-specific config file (`herald.{profile}.toml`)
//! 4. Main config file (`herald.toml` or `config.toml`)
//! 5. Environment variables (`HERALD_*`)
//! 6. `DISCORD_TOKEN`, mapped to `gateway.token`
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: `herald.toml`, `config.toml`
//! - `yaml-config`: `herald.yaml`, `herald.yml`, `config.yaml`, `config.yml`
//!
//! # Environment Variable Mapping
//!
//! `HERALD_` prefix with `__` as the nesting separator:
//!
//! - `HERALD_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `HERALD_GATEWAY__READY_TIMEOUT_SECS=60` → `gateway.ready_timeout_secs = 60`
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./deploy/herald.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use herald_core::{ConfigError, ConfigResult};
use tracing::{debug, info, trace, warn};

use super::schema::HeraldConfig;
use super::validation::validate_config;

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Environment variable selecting the configuration profile.
pub const PROFILE_ENV: &str = "HERALD_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting `dev` and `prod` shorthands.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `HERALD_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    ///
    /// Once any path is added the default search paths (current directory,
    /// then the user config directory) are no longer consulted.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load, skipping the search.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables, including `DISCORD_TOKEN`.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Replaces the built-in defaults with `config`. Files and environment
    /// variables still override it.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<HeraldConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: HeraldConfig = figment
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            commands = config.commands.len(),
            token_set = config.gateway.token.is_some(),
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(HeraldConfig::default()))
            .merge(std::mem::take(&mut self.figment));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with HERALD_ prefix");
            figment = figment
                .merge(
                    Env::prefixed("HERALD_")
                        .ignore(&["PROFILE"])
                        .split("__"),
                )
                .merge(
                    Env::raw()
                        .only(&[TOKEN_ENV])
                        .map(|_| "gateway.token".into()),
                );
        }

        Ok(figment)
    }

    /// Merges a single config file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::Parse(format!(
                "unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("herald"));
        }
        paths
    }

    /// Tries `search_paths × base_names`, merging the profile variant before
    /// the base file. Stops at the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["herald.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["herald.yaml", "herald.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!(paths = ?search_paths, "No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<HeraldConfig> {
    ConfigLoader::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();

            assert_eq!(config.logging.level, LogLevel::Info);
            assert_eq!(config.gateway.ready_timeout_secs, 30);
            assert!(config.gateway.token.is_none());
            assert!(config.commands.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_discord_token_env_maps_to_gateway_token() {
        Jail::expect_with(|jail| {
            jail.set_env("DISCORD_TOKEN", "abc.def.ghi");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();

            assert_eq!(config.gateway.token.as_deref(), Some("abc.def.ghi"));
            Ok(())
        });
    }

    #[test]
    fn test_discord_token_overrides_file_and_prefixed_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "herald.toml",
                r#"
                [gateway]
                token = "from-file"
                ready_timeout_secs = 5
                "#,
            )?;
            jail.set_env("HERALD_GATEWAY__READY_TIMEOUT_SECS", "12");
            jail.set_env("DISCORD_TOKEN", "from-env");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();

            assert_eq!(config.gateway.token.as_deref(), Some("from-env"));
            assert_eq!(config.gateway.ready_timeout_secs, 12);
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_layered_under_base_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "herald.production.toml",
                r#"
                [logging]
                level = "warn"
                format = "full"
                "#,
            )?;
            jail.create_file(
                "herald.toml",
                r#"
                [logging]
                level = "debug"

                [[commands]]
                trigger = "!about"
                reply = "Herald, a chat bot"
                description = "What this bot is"
                "#,
            )?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();

            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.logging.format, crate::config::LogFormat::Full);
            assert_eq!(config.commands.len(), 1);
            assert_eq!(config.commands[0].trigger, "!about");
            assert_eq!(config.commands[0].description, "What this bot is");
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/herald.toml")
            .without_env()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "herald.toml",
                r#"
                [[commands]]
                trigger = "!about"
                reply = "Herald"
                "#,
            )?;

            let err = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap_err();

            assert!(matches!(err, ConfigError::Validation { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_unknown_log_level_is_a_parse_error() {
        Jail::expect_with(|jail| {
            jail.set_env("HERALD_LOGGING__LEVEL", "chatty");

            let err = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap_err();

            assert!(matches!(err, ConfigError::Parse(_)));
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
