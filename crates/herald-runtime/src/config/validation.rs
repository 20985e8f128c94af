//! Configuration validation utilities.

use std::collections::HashSet;

use herald_core::{ConfigError, ConfigResult};
use tracing::warn;

use super::schema::{
    GatewayConfig, HelpConfig, HeraldConfig, LogOutput, LoggingConfig, ReplyCommand,
};

/// Validates the entire configuration.
///
/// The token is not checked here: its absence is reported when the runtime
/// builds credentials, so a config without one can still be loaded and
/// inspected.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_gateway_config(&config.gateway)?;
    validate_logging_config(&config.logging)?;
    validate_help_config(&config.help)?;
    validate_commands(&config.commands)?;
    Ok(())
}

fn validate_gateway_config(gateway: &GatewayConfig) -> ConfigResult<()> {
    if gateway.ready_timeout_secs == 0 {
        return Err(ConfigError::validation(
            "gateway.ready_timeout_secs must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output = \"file\"",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "logging.filters contains an empty module name: {module:?}"
        )));
    }

    Ok(())
}

fn validate_help_config(help: &HelpConfig) -> ConfigResult<()> {
    if help.enabled && help.trigger.is_empty() {
        return Err(ConfigError::validation(
            "help.trigger must not be empty while help is enabled",
        ));
    }
    Ok(())
}

fn validate_commands(commands: &[ReplyCommand]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for (index, command) in commands.iter().enumerate() {
        if command.trigger.is_empty() {
            return Err(ConfigError::validation(format!(
                "commands[{index}].trigger must not be empty"
            )));
        }
        if command.reply.is_empty() {
            return Err(ConfigError::validation(format!(
                "commands[{index}].reply must not be empty (trigger {:?})",
                command.trigger
            )));
        }
        if command.description.trim().is_empty() {
            return Err(ConfigError::validation(format!(
                "commands[{index}].description must not be empty (trigger {:?})",
                command.trigger
            )));
        }
        if !seen.insert(command.trigger.as_str()) {
            warn!(
                trigger = %command.trigger,
                "Trigger configured more than once, the last entry wins"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn command(trigger: &str, reply: &str) -> ReplyCommand {
        ReplyCommand {
            trigger: trigger.to_string(),
            reply: reply.to_string(),
            description: format!("Replies to {trigger}"),
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&HeraldConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = HeraldConfig::default();
        config.gateway.ready_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = HeraldConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/herald.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_commands() {
        let mut config = HeraldConfig::default();

        config.commands = vec![command("!about", "Herald"), command("!about", "again")];
        assert!(validate_config(&config).is_ok());

        config.commands = vec![command("", "text")];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation { .. })
        ));

        config.commands = vec![command("!empty", "")];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_command_needs_description() {
        let mut config = HeraldConfig::default();
        let mut undescribed = command("!about", "Herald");
        undescribed.description = "  ".to_string();
        config.commands = vec![undescribed];

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("commands[0].description"), "{err}");
    }

    #[test]
    fn test_validate_help_trigger() {
        let mut config = HeraldConfig::default();
        config.help.trigger = String::new();
        assert!(validate_config(&config).is_err());

        config.help.enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
