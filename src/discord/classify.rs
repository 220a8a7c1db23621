//! Classification of command failures into user-facing responses.
//!
//! A failed dispatch produces exactly one notice or reaction. The mapping
//! is ordered so the caller-actionable cases report precisely before the
//! generic internal-error catch-all.

use tracing::{debug, error};

use crate::common::error::{CommandError, TransportError};
use crate::config::types::EmojiPair;
use crate::discord::dispatch::InvocationContext;

const INTERNAL_ERROR_NOTICE: &str = "An internal error occured while trying to run that command.";

/// What to do about a failed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorAction {
    /// Notify the author privately.
    PrivateNotice(String),
    /// Notify the author privately, falling back to the channel when
    /// direct delivery is forbidden.
    PrivateNoticeOrChannel(String),
    /// React to the offending message with the failure emoji.
    FailureReaction,
    /// Reply in the original channel with the given text.
    ChannelNotice(String),
    /// Log the underlying cause and post a generic notice in the channel.
    InternalNotice,
}

pub struct ErrorClassifier {
    emojis: EmojiPair,
}

impl ErrorClassifier {
    pub fn new(emojis: EmojiPair) -> Self {
        Self { emojis }
    }

    /// Map a command failure to its response action.
    ///
    /// State-free; the closed error enum makes the match exhaustive, so no
    /// failure can fall through unhandled.
    pub fn classify(&self, error: &CommandError) -> ErrorAction {
        match error {
            CommandError::GuildOnly => ErrorAction::PrivateNotice(error.to_string()),
            CommandError::Disabled => ErrorAction::PrivateNoticeOrChannel(error.to_string()),
            CommandError::NotOwner => ErrorAction::FailureReaction,
            CommandError::UserInput(detail) => ErrorAction::ChannelNotice(detail.clone()),
            CommandError::Internal(_) => ErrorAction::InternalNotice,
        }
    }

    /// Classify `error` and carry out the resulting action.
    ///
    /// Transport failures raised while reporting are suppressed; reporting
    /// an error never produces a second one.
    pub async fn report(&self, ctx: &InvocationContext, command: &str, error: &CommandError) {
        match self.classify(error) {
            ErrorAction::PrivateNotice(text) => {
                suppress(ctx.direct(&text).await);
            }
            ErrorAction::PrivateNoticeOrChannel(text) => match ctx.direct(&text).await {
                Err(TransportError::Forbidden) => suppress(ctx.say(&text).await),
                other => suppress(other),
            },
            ErrorAction::FailureReaction => {
                error!(
                    "{} tried to run {} but is not the owner",
                    ctx.author_name, command
                );
                suppress(ctx.react(&self.emojis.failure).await);
            }
            ErrorAction::ChannelNotice(text) => {
                suppress(ctx.say(&text).await);
            }
            ErrorAction::InternalNotice => {
                if let CommandError::Internal(cause) = error {
                    error!("\"{}\" caused an exception", ctx.content);
                    error!("{:?}", cause);
                }
                suppress(ctx.say(INTERNAL_ERROR_NOTICE).await);
            }
        }
    }
}

/// Swallow a transport failure raised while reporting another error.
fn suppress(result: Result<(), TransportError>) {
    if let Err(error) = result {
        debug!("Suppressed transport error during error report: {}", error);
    }
}
