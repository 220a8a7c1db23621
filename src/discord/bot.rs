//! Discord bot setup and connection.
//!
//! Wires the serenity gateway client to the command dispatcher: each
//! inbound message is reduced to the fields dispatch needs and handed off.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{debug, info};

use crate::common::{BotIdentity, InboundMessage};
use crate::discord::dispatch::{CommandDispatcher, InvocationContext};
use crate::discord::outbound::DiscordOutbound;

/// Serenity event handler that feeds messages into the dispatcher.
struct BridgeHandler {
    dispatcher: Arc<CommandDispatcher>,
}

#[async_trait]
impl EventHandler for BridgeHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Logged in as: {}", ready.user.name);
        info!("ID: {}", ready.user.id);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let identity = {
            let user = ctx.cache.current_user();
            BotIdentity {
                id: user.id.get(),
                name: user.name.clone(),
            }
        };

        let inbound = InboundMessage {
            author_id: msg.author.id.get(),
            author_name: msg.author.name.clone(),
            content: msg.content.clone(),
            channel_id: msg.channel_id.get(),
            message_id: msg.id.get(),
            is_direct: msg.guild_id.is_none(),
            is_from_self: msg.author.id.get() == identity.id,
        };

        let invocation_ctx = InvocationContext {
            outbound: Arc::new(DiscordOutbound::new(ctx.http.clone())),
            channel_id: inbound.channel_id,
            message_id: inbound.message_id,
            author_id: inbound.author_id,
            author_name: inbound.author_name.clone(),
            content: inbound.content.clone(),
        };

        let outcome = self
            .dispatcher
            .dispatch(&inbound, &identity, &invocation_ctx)
            .await;
        debug!(?outcome, "Dispatched Discord message");
    }
}

/// The Discord side of the bridge.
pub struct DiscordBot {
    token: String,
    dispatcher: Arc<CommandDispatcher>,
}

impl DiscordBot {
    /// The dispatcher's registry must already hold every extension; handlers
    /// are in place before the gateway can deliver an event.
    pub fn new(token: String, dispatcher: Arc<CommandDispatcher>) -> Self {
        Self { token, dispatcher }
    }

    /// Connect to the gateway and process events until the connection ends.
    pub async fn start(self) -> anyhow::Result<()> {
        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILDS;

        let handler = BridgeHandler {
            dispatcher: self.dispatcher,
        };

        let mut client = Client::builder(&self.token, intents)
            .event_handler(handler)
            .await?;

        client.start().await?;
        Ok(())
    }
}
