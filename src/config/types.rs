//! Configuration type definitions.

use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub irc: IrcConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub tokens: TokensConfig,
    /// Command prefix. When unset the bot advertises `@BotName ` and only
    /// answers to that form or to a direct mention.
    pub prefix: Option<String>,
    /// Discord user ID allowed to run owner-gated commands.
    pub owner_id: Option<u64>,
    /// Extensions loaded at startup, in order.
    #[serde(default)]
    pub startup_extensions: Vec<String>,
    /// Emojis used to react to failed and successful commands.
    #[serde(default)]
    pub success_or_failure_emojis: EmojiPair,
}

/// Secret tokens for the Discord connection.
#[derive(Debug, Clone, Deserialize)]
pub struct TokensConfig {
    pub discord: String,
}

/// Reaction emoji pair for command outcomes.
#[derive(Debug, Clone, Deserialize)]
pub struct EmojiPair {
    pub failure: String,
    pub success: String,
}

impl Default for EmojiPair {
    fn default() -> Self {
        Self {
            failure: "❌".to_string(),
            success: "✅".to_string(),
        }
    }
}

/// IRC server connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    pub hostname: String,
    pub port: u16,
    /// Nickname to register with.
    pub name: String,
    /// Channels to join after registration, in order.
    #[serde(default)]
    pub channels: Vec<String>,
}
