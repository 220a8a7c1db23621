//! Top-level supervision of the two network clients.
//!
//! Both clients start concurrently on the shared runtime; neither waits for
//! the other. A fatal failure in either one ends the whole bridge instead
//! of leaving a half-connected process running.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::common::IrcEvent;
use crate::config::Config;
use crate::discord::classify::ErrorClassifier;
use crate::discord::dispatch::CommandDispatcher;
use crate::discord::extensions::{CommandRegistry, ExtensionEnv};
use crate::discord::prefix::PrefixResolver;
use crate::discord::DiscordBot;
use crate::irc::IrcClient;

/// Owns both protocol clients and runs them to completion.
pub struct Bridge {
    config: Config,
}

impl Bridge {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the bridge until a shutdown signal or a fatal client error.
    pub async fn run(self) -> Result<()> {
        let (irc_client, irc_handle, irc_events) = IrcClient::new(self.config.irc.clone());

        // Extensions load before the Discord client authenticates, so every
        // handler is registered before the first event can be dispatched.
        let env = ExtensionEnv {
            irc: irc_handle,
            irc_config: self.config.irc.clone(),
            emojis: self.config.discord.success_or_failure_emojis.clone(),
        };
        let mut registry = CommandRegistry::new();
        for extension in &self.config.discord.startup_extensions {
            registry
                .load(extension, &env)
                .with_context(|| format!("Failed to load extension '{}'", extension))?;
        }

        let resolver = PrefixResolver::new(self.config.discord.prefix.clone());
        let classifier =
            ErrorClassifier::new(self.config.discord.success_or_failure_emojis.clone());
        let dispatcher = Arc::new(CommandDispatcher::new(
            resolver,
            registry,
            classifier,
            self.config.discord.owner_id,
        ));

        let discord = DiscordBot::new(self.config.discord.tokens.discord.clone(), dispatcher);

        let mut discord_task = tokio::spawn(discord.start());
        let mut irc_task = tokio::spawn(irc_client.start());
        let events_task = tokio::spawn(log_irc_events(irc_events));

        let result = tokio::select! {
            biased;
            _ = shutdown_signal() => {
                info!("Shutdown signal received - exiting");
                Ok(())
            }
            joined = &mut discord_task => flatten("Discord client", joined),
            joined = &mut irc_task => {
                flatten("IRC client", joined.map(|r| r.map_err(Into::into)))
            }
        };

        discord_task.abort();
        irc_task.abort();
        events_task.abort();
        result
    }
}

/// Collapse a task join result and the client's own result into one.
fn flatten(
    name: &str,
    joined: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match joined {
        Ok(Ok(())) => {
            info!("{} exited", name);
            Ok(())
        }
        Ok(Err(error)) => Err(error.context(format!("{} failed", name))),
        Err(error) => Err(anyhow::anyhow!("{} task panicked: {}", name, error)),
    }
}

/// Drain the IRC event feed into the log.
///
/// Relaying into Discord is a command-extension concern; the feed is logged
/// here so inbound IRC traffic stays visible.
async fn log_irc_events(mut events: mpsc::UnboundedReceiver<IrcEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            IrcEvent::Registered { server } => debug!("IRC registered with {}", server),
            IrcEvent::Joined { channel } => debug!("IRC joined {}", channel),
            IrcEvent::Message {
                sender,
                target,
                text,
            } => info!("IRC [{}] <{}> {}", target, sender, text),
            IrcEvent::Notice {
                sender,
                target,
                text,
            } => debug!("IRC notice [{}] <{}> {}", target, sender, text),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{DiscordConfig, EmojiPair, IrcConfig, TokensConfig};

    fn make_config(extensions: Vec<&str>) -> Config {
        Config {
            discord: DiscordConfig {
                tokens: TokensConfig {
                    discord: "token".to_string(),
                },
                prefix: Some("!".to_string()),
                owner_id: None,
                startup_extensions: extensions.into_iter().map(str::to_string).collect(),
                success_or_failure_emojis: EmojiPair::default(),
            },
            irc: IrcConfig {
                hostname: "irc.example.net".to_string(),
                port: 6667,
                name: "bridgebot".to_string(),
                channels: vec!["#bridge".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn unknown_startup_extension_is_fatal_before_any_connection() {
        let error = Bridge::new(make_config(vec!["telepathy"]))
            .run()
            .await
            .unwrap_err();
        assert!(error.to_string().contains("telepathy"));
    }
}
