//! Skybridge - Discord-IRC chat bridge
//!
//! A bot that connects a Discord guild and an IRC network under one
//! process: prefix commands dispatched on the Discord side, a registered
//! IRC client on the other, both supervised by one runtime.

mod bridge;
mod common;
mod config;
mod discord;
mod irc;

use anyhow::Result;
use tracing::{error, info};

use bridge::Bridge;
use config::env::get_config_path;
use config::load_and_validate;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Skybridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!(
            "Please ensure {} exists and is properly formatted.",
            config_path
        );
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  IRC server: {}:{}", config.irc.hostname, config.irc.port);
    info!("  IRC nick: {}", config.irc.name);
    info!("  IRC channels: {}", config.irc.channels.join(", "));
    match &config.discord.prefix {
        Some(prefix) => info!("  Command prefix: {}", prefix),
        None => info!("  Command prefix: mention"),
    }

    Bridge::new(config).run().await
}
