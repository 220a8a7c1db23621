//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `SKYBRIDGE_DISCORD_TOKEN` - Discord bot token
//! - `SKYBRIDGE_IRC_NICK` - IRC nickname to register with

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "SKYBRIDGE";

/// Apply environment variable overrides to a config.
///
/// This allows sensitive values like the Discord token to be provided
/// via environment variables instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.tokens.discord = token;
    }

    if let Ok(nick) = env::var(format!("{}_IRC_NICK", ENV_PREFIX)) {
        config.irc.name = nick;
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `SKYBRIDGE_CONFIG` environment variable, otherwise returns "skybridge.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "skybridge.conf".to_string())
}
