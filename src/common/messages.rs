//! Canonical message types exchanged between the adapters and the dispatch core.

/// Identity of the logged-in Discord bot user.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: u64,
    /// Display name, used for the mention-style default prefix.
    pub name: String,
}

/// A chat message received from Discord, reduced to what dispatch needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
    pub channel_id: u64,
    pub message_id: u64,
    /// True for direct messages, false for guild channels.
    pub is_direct: bool,
    /// True when the message was authored by the bot itself.
    pub is_from_self: bool,
}

/// An event received from the IRC connection.
#[derive(Debug, Clone)]
pub enum IrcEvent {
    /// Registration completed (server welcome).
    Registered { server: String },
    /// The bot joined a channel.
    Joined { channel: String },
    /// A PRIVMSG addressed to a channel or to the bot.
    Message {
        sender: String,
        target: String,
        text: String,
    },
    /// A NOTICE from the server or another user.
    Notice {
        sender: String,
        target: String,
        text: String,
    },
}
