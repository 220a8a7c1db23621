//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.
//! Runs once at startup; any failure here is fatal before either network
//! connection is attempted.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.tokens.discord.trim().is_empty() {
        errors.push("discord.tokens.discord is required".to_string());
    }
    if let Some(prefix) = &config.discord.prefix {
        if prefix.is_empty() {
            errors.push("discord.prefix must not be empty when set".to_string());
        }
    }

    // Validate IRC config
    if config.irc.hostname.trim().is_empty() {
        errors.push("irc.hostname is required".to_string());
    }
    if config.irc.port == 0 {
        errors.push("irc.port must be non-zero".to_string());
    }
    if config.irc.name.trim().is_empty() {
        errors.push("irc.name is required".to_string());
    }
    for (i, channel) in config.irc.channels.iter().enumerate() {
        if !channel.starts_with('#') && !channel.starts_with('&') {
            errors.push(format!(
                "irc.channels[{}] '{}' must start with '#' or '&'",
                i, channel
            ));
        }
    }

    // Validate reaction emojis (try to resolve them)
    let pair = &config.discord.success_or_failure_emojis;
    for (field, emoji) in [("failure", &pair.failure), ("success", &pair.success)] {
        if emojis::get(emoji).is_none() {
            errors.push(format!(
                "success_or_failure_emojis.{} is not a known emoji: '{}'",
                field, emoji
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
