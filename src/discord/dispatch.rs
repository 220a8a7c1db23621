//! Command dispatch for Discord messages.

use std::sync::Arc;

use tracing::debug;

use crate::common::error::{CommandError, CommandErrorKind, TransportError};
use crate::common::{BotIdentity, InboundMessage};
use crate::discord::classify::ErrorClassifier;
use crate::discord::extensions::{Command, CommandRegistry};
use crate::discord::outbound::Outbound;
use crate::discord::prefix::PrefixResolver;

/// A recognized command request extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub prefix: String,
    /// Command name, lowercased for registry lookup.
    pub command: String,
    /// Raw argument text following the command name.
    pub args: String,
}

/// Back-references needed to reply to the message that triggered a command.
///
/// Holds the REST client behind a trait object, never the gateway
/// connection; keeping a context alive keeps nothing else alive.
#[derive(Clone)]
pub struct InvocationContext {
    pub outbound: Arc<dyn Outbound>,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub author_name: String,
    /// Original message content, kept for diagnostics.
    pub content: String,
}

impl InvocationContext {
    /// Reply in the channel the message came from.
    pub async fn say(&self, text: &str) -> Result<(), TransportError> {
        self.outbound.send_message(self.channel_id, text).await
    }

    /// Send the author a direct message.
    pub async fn direct(&self, text: &str) -> Result<(), TransportError> {
        self.outbound.send_direct(self.author_id, text).await
    }

    /// React to the original message.
    pub async fn react(&self, emoji: &str) -> Result<(), TransportError> {
        self.outbound
            .send_reaction(self.channel_id, self.message_id, emoji)
            .await
    }
}

/// Result of dispatching one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command, or sent by the bot itself.
    NoOp,
    /// A handler ran to completion.
    Handled,
    /// A handler was selected but failed; the failure has been reported.
    HandledWithError(CommandErrorKind),
}

pub struct CommandDispatcher {
    resolver: PrefixResolver,
    registry: CommandRegistry,
    classifier: ErrorClassifier,
    owner_id: Option<u64>,
}

impl CommandDispatcher {
    pub fn new(
        resolver: PrefixResolver,
        registry: CommandRegistry,
        classifier: ErrorClassifier,
        owner_id: Option<u64>,
    ) -> Self {
        Self {
            resolver,
            registry,
            classifier,
            owner_id,
        }
    }

    /// Dispatch one inbound message.
    ///
    /// Messages authored by the bot are dropped before prefix resolution;
    /// unrecognized commands are ignored. At most one handler runs, and any
    /// failure is reported through the classifier before returning.
    pub async fn dispatch(
        &self,
        message: &InboundMessage,
        identity: &BotIdentity,
        ctx: &InvocationContext,
    ) -> DispatchOutcome {
        if message.is_from_self {
            return DispatchOutcome::NoOp;
        }

        let prefixes = self.resolver.resolve(&message.content, identity);
        let Some(invocation) = parse_invocation(&message.content, &prefixes) else {
            return DispatchOutcome::NoOp;
        };

        let Some(command) = self.registry.lookup(&invocation.command) else {
            debug!(command = %invocation.command, "No handler registered");
            return DispatchOutcome::NoOp;
        };

        match self.check_and_run(command, &invocation, message, ctx).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(error) => {
                let kind = error.kind();
                self.classifier
                    .report(ctx, &invocation.command, &error)
                    .await;
                DispatchOutcome::HandledWithError(kind)
            }
        }
    }

    async fn check_and_run(
        &self,
        command: &Command,
        invocation: &Invocation,
        message: &InboundMessage,
        ctx: &InvocationContext,
    ) -> Result<(), CommandError> {
        if command.guild_only && message.is_direct {
            return Err(CommandError::GuildOnly);
        }
        if !command.enabled {
            return Err(CommandError::Disabled);
        }
        if command.owner_only && Some(message.author_id) != self.owner_id {
            return Err(CommandError::NotOwner);
        }
        command.run(ctx, &invocation.args).await
    }
}

/// Derive an invocation by stripping the first accepted prefix found at the
/// start of the message. At most one invocation comes out of one message.
fn parse_invocation(content: &str, prefixes: &[String]) -> Option<Invocation> {
    for prefix in prefixes {
        let Some(rest) = content.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let rest = rest.trim_start();
        if rest.is_empty() {
            continue;
        }
        let (command, args) = match rest.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (rest, ""),
        };
        return Some(Invocation {
            prefix: prefix.clone(),
            command: command.to_lowercase(),
            args: args.to_string(),
        });
    }
    None
}
