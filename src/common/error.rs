//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors raised while connecting to or talking to the IRC server.
#[derive(Debug, Error)]
pub enum IrcError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Registration rejected: {reply}")]
    RegistrationRejected { reply: String },

    #[error("Cannot join {channel}: {reply}")]
    JoinRejected { channel: String, reply: String },

    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised by outbound send and react operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The API refused delivery (missing permission, closed DMs).
    #[error("Delivery forbidden")]
    Forbidden,

    #[error("Discord API error: {0}")]
    Discord(#[from] serenity::Error),
}

/// A failure produced while dispatching a command.
///
/// Every way a dispatch can fail is enumerated here; the classifier maps
/// each variant to exactly one user-facing action.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A guild-only command was invoked from a direct message.
    #[error("This command cannot be used in private messages.")]
    GuildOnly,

    /// The command is administratively disabled.
    #[error("Sorry. This command is disabled and cannot be used.")]
    Disabled,

    /// The caller is not the configured bot owner.
    #[error("Only the bot owner can use this command.")]
    NotOwner,

    /// Malformed input or a failed precondition, with caller-facing detail.
    #[error("{0}")]
    UserInput(String),

    /// Unclassified failure inside a handler, wrapping the opaque cause.
    #[error("Internal command error: {0}")]
    Internal(anyhow::Error),
}

impl CommandError {
    pub fn kind(&self) -> CommandErrorKind {
        match self {
            CommandError::GuildOnly => CommandErrorKind::GuildOnly,
            CommandError::Disabled => CommandErrorKind::Disabled,
            CommandError::NotOwner => CommandErrorKind::NotOwner,
            CommandError::UserInput(_) => CommandErrorKind::UserInput,
            CommandError::Internal(_) => CommandErrorKind::Internal,
        }
    }
}

impl From<TransportError> for CommandError {
    fn from(error: TransportError) -> Self {
        CommandError::Internal(error.into())
    }
}

/// Discriminant of a [`CommandError`], reported in dispatch outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandErrorKind {
    GuildOnly,
    Disabled,
    NotOwner,
    UserInput,
    Internal,
}

/// Errors raised while loading command extensions.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Unknown extension: {name}")]
    Unknown { name: String },

    #[error("Extension '{name}' registered duplicate command '{command}'")]
    DuplicateCommand { name: String, command: String },
}
