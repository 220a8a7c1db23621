//! Outbound delivery operations against the Discord API.

use std::sync::Arc;

use serenity::async_trait;
use serenity::http::{Http, HttpError};
use serenity::model::channel::ReactionType;
use serenity::model::id::{ChannelId, MessageId, UserId};

use crate::common::error::TransportError;

/// Narrow interface for sending replies, private notices, and reactions.
///
/// Dispatch and error reporting talk to Discord through this trait so the
/// command pipeline can be exercised without a live gateway connection.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send a message to a channel.
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), TransportError>;

    /// Send a direct message to a user.
    async fn send_direct(&self, user_id: u64, text: &str) -> Result<(), TransportError>;

    /// Add a reaction to a message.
    async fn send_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), TransportError>;
}

/// Serenity-backed implementation used by the live bot.
pub struct DiscordOutbound {
    http: Arc<Http>,
}

impl DiscordOutbound {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Outbound for DiscordOutbound {
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), TransportError> {
        ChannelId::new(channel_id)
            .say(&self.http, text)
            .await
            .map(|_| ())
            .map_err(map_serenity_error)
    }

    async fn send_direct(&self, user_id: u64, text: &str) -> Result<(), TransportError> {
        let dm = UserId::new(user_id)
            .create_dm_channel(&self.http)
            .await
            .map_err(map_serenity_error)?;
        dm.id
            .say(&self.http, text)
            .await
            .map(|_| ())
            .map_err(map_serenity_error)
    }

    async fn send_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), TransportError> {
        self.http
            .create_reaction(
                ChannelId::new(channel_id),
                MessageId::new(message_id),
                &ReactionType::Unicode(emoji.to_string()),
            )
            .await
            .map_err(map_serenity_error)
    }
}

/// Surface permission rejections distinctly; the disabled-command notice
/// falls back to the channel on exactly that case.
fn map_serenity_error(error: serenity::Error) -> TransportError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(ref response)) = error {
        if response.status_code.as_u16() == 403 {
            return TransportError::Forbidden;
        }
    }
    TransportError::Discord(error)
}
