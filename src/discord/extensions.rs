//! Command extensions and the handler registry.
//!
//! Extensions bundle related command handlers. They are loaded by name at
//! startup, before the bot authenticates, so every handler is registered
//! before the first message can arrive.

use std::collections::HashMap;

use serenity::async_trait;
use tracing::info;

use crate::common::error::{CommandError, ExtensionError, IrcError};
use crate::config::types::{EmojiPair, IrcConfig};
use crate::discord::dispatch::InvocationContext;
use crate::irc::IrcHandle;

/// A command handler. Receives the invocation context and the raw argument
/// text that followed the command name.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &InvocationContext, args: &str) -> Result<(), CommandError>;
}

/// A registered command with its invocation guards.
pub struct Command {
    pub name: &'static str,
    /// Reject invocation from direct messages.
    pub guild_only: bool,
    /// Restrict to the configured bot owner.
    pub owner_only: bool,
    /// Disabled commands stay registered but refuse to run.
    pub enabled: bool,
    handler: Box<dyn CommandHandler>,
}

impl Command {
    pub fn new(name: &'static str, handler: Box<dyn CommandHandler>) -> Self {
        Self {
            name,
            guild_only: false,
            owner_only: false,
            enabled: true,
            handler,
        }
    }

    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    #[allow(dead_code)]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub async fn run(&self, ctx: &InvocationContext, args: &str) -> Result<(), CommandError> {
        self.handler.run(ctx, args).await
    }
}

/// Collaborators handed to extensions as they load.
#[derive(Clone)]
pub struct ExtensionEnv {
    pub irc: IrcHandle,
    pub irc_config: IrcConfig,
    pub emojis: EmojiPair,
}

/// Registry of command handlers, keyed by lowercase command name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an extension by name, registering its commands.
    pub fn load(&mut self, extension: &str, env: &ExtensionEnv) -> Result<(), ExtensionError> {
        let commands = match extension {
            "core" => core_commands(),
            "irc" => irc_commands(env),
            _ => {
                return Err(ExtensionError::Unknown {
                    name: extension.to_string(),
                })
            }
        };

        for command in commands {
            self.register(command).map_err(|e| match e {
                ExtensionError::DuplicateCommand { command, .. } => {
                    ExtensionError::DuplicateCommand {
                        name: extension.to_string(),
                        command,
                    }
                }
                other => other,
            })?;
        }

        info!("Successfully loaded {}", extension);
        Ok(())
    }

    /// Register a single command.
    pub fn register(&mut self, command: Command) -> Result<(), ExtensionError> {
        if self.commands.contains_key(command.name) {
            return Err(ExtensionError::DuplicateCommand {
                name: String::new(),
                command: command.name.to_string(),
            });
        }
        self.commands.insert(command.name.to_string(), command);
        Ok(())
    }

    /// Look up a handler by normalized (lowercase) command name.
    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }
}

fn core_commands() -> Vec<Command> {
    vec![
        Command::new("ping", Box::new(Ping)),
        Command::new("echo", Box::new(Echo)),
    ]
}

fn irc_commands(env: &ExtensionEnv) -> Vec<Command> {
    vec![
        Command::new(
            "channels",
            Box::new(Channels {
                config: env.irc_config.clone(),
            }),
        ),
        Command::new(
            "relay",
            Box::new(Relay {
                irc: env.irc.clone(),
                emojis: env.emojis.clone(),
            }),
        )
        .guild_only(),
        Command::new(
            "disconnect",
            Box::new(Disconnect {
                irc: env.irc.clone(),
            }),
        )
        .owner_only(),
    ]
}

struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn run(&self, ctx: &InvocationContext, _args: &str) -> Result<(), CommandError> {
        ctx.say("Pong!").await?;
        Ok(())
    }
}

struct Echo;

#[async_trait]
impl CommandHandler for Echo {
    async fn run(&self, ctx: &InvocationContext, args: &str) -> Result<(), CommandError> {
        if args.is_empty() {
            return Err(CommandError::UserInput(
                "Give me something to repeat.".to_string(),
            ));
        }
        ctx.say(args).await?;
        Ok(())
    }
}

/// Reports the IRC server and channels this bridge is configured for.
struct Channels {
    config: IrcConfig,
}

#[async_trait]
impl CommandHandler for Channels {
    async fn run(&self, ctx: &InvocationContext, _args: &str) -> Result<(), CommandError> {
        let text = format!(
            "Bridged to {}:{} as {} — channels: {}",
            self.config.hostname,
            self.config.port,
            self.config.name,
            self.config.channels.join(", "),
        );
        ctx.say(&text).await?;
        Ok(())
    }
}

/// Sends a line to an IRC channel: `relay <#channel> <text>`.
struct Relay {
    irc: IrcHandle,
    emojis: EmojiPair,
}

#[async_trait]
impl CommandHandler for Relay {
    async fn run(&self, ctx: &InvocationContext, args: &str) -> Result<(), CommandError> {
        let usage = "Usage: relay <#channel> <text>";
        let Some((target, text)) = args.split_once(' ') else {
            return Err(CommandError::UserInput(usage.to_string()));
        };
        let text = text.trim();
        if !(target.starts_with('#') || target.starts_with('&')) || text.is_empty() {
            return Err(CommandError::UserInput(usage.to_string()));
        }

        self.irc
            .privmsg(target, text)
            .map_err(|e: IrcError| CommandError::Internal(e.into()))?;

        // Reaction is best-effort; the relay already went out.
        let _ = ctx.react(&self.emojis.success).await;
        Ok(())
    }
}

/// Disconnects the IRC side of the bridge.
struct Disconnect {
    irc: IrcHandle,
}

#[async_trait]
impl CommandHandler for Disconnect {
    async fn run(&self, ctx: &InvocationContext, _args: &str) -> Result<(), CommandError> {
        self.irc
            .quit("Disconnected by operator")
            .map_err(|e: IrcError| CommandError::Internal(e.into()))?;
        ctx.say("Disconnecting from IRC.").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::outbound::testing::RecordingOutbound;
    use crate::irc::client::IrcRequest;
    use std::sync::Arc;

    fn test_env() -> (ExtensionEnv, tokio::sync::mpsc::UnboundedReceiver<IrcRequest>) {
        let (handle, request_rx) = IrcHandle::test_pair();
        let env = ExtensionEnv {
            irc: handle,
            irc_config: IrcConfig {
                hostname: "irc.example.net".to_string(),
                port: 6667,
                name: "bridgebot".to_string(),
                channels: vec!["#bridge".to_string()],
            },
            emojis: EmojiPair::default(),
        };
        (env, request_rx)
    }

    fn context(outbound: Arc<RecordingOutbound>) -> InvocationContext {
        InvocationContext {
            outbound,
            channel_id: 100,
            message_id: 200,
            author_id: 7,
            author_name: "alice".to_string(),
            content: "!test".to_string(),
        }
    }

    #[test]
    fn unknown_extension_fails_to_load() {
        let (env, _rx) = test_env();
        let mut registry = CommandRegistry::new();
        assert!(matches!(
            registry.load("telepathy", &env),
            Err(ExtensionError::Unknown { name }) if name == "telepathy"
        ));
    }

    #[test]
    fn loading_registers_all_commands() {
        let (env, _rx) = test_env();
        let mut registry = CommandRegistry::new();
        registry.load("core", &env).unwrap();
        registry.load("irc", &env).unwrap();

        assert!(registry.lookup("ping").is_some());
        assert!(registry.lookup("echo").is_some());
        assert!(registry.lookup("channels").is_some());
        assert!(registry.lookup("relay").is_some());
        assert!(registry.lookup("disconnect").is_some());
        assert!(registry.lookup("frobnicate").is_none());
    }

    #[test]
    fn double_loading_reports_the_duplicate() {
        let (env, _rx) = test_env();
        let mut registry = CommandRegistry::new();
        registry.load("core", &env).unwrap();
        assert!(matches!(
            registry.load("core", &env),
            Err(ExtensionError::DuplicateCommand { name, .. }) if name == "core"
        ));
    }

    #[test]
    fn guards_are_set_per_command() {
        let (env, _rx) = test_env();
        let mut registry = CommandRegistry::new();
        registry.load("irc", &env).unwrap();

        assert!(registry.lookup("relay").unwrap().guild_only);
        assert!(registry.lookup("disconnect").unwrap().owner_only);
        assert!(!registry.lookup("channels").unwrap().guild_only);
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let outbound = Arc::new(RecordingOutbound::default());
        let ctx = context(outbound.clone());

        Ping.run(&ctx, "").await.unwrap();

        assert_eq!(outbound.message_texts(), vec!["Pong!"]);
    }

    #[tokio::test]
    async fn echo_requires_text() {
        let outbound = Arc::new(RecordingOutbound::default());
        let ctx = context(outbound.clone());

        let result = Echo.run(&ctx, "").await;

        assert!(matches!(result, Err(CommandError::UserInput(_))));
        assert!(outbound.message_texts().is_empty());
    }

    #[tokio::test]
    async fn relay_rejects_malformed_targets() {
        let (env, _rx) = test_env();
        let relay = Relay {
            irc: env.irc.clone(),
            emojis: env.emojis.clone(),
        };
        let outbound = Arc::new(RecordingOutbound::default());
        let ctx = context(outbound);

        assert!(matches!(
            relay.run(&ctx, "bridge hello").await,
            Err(CommandError::UserInput(_))
        ));
        assert!(matches!(
            relay.run(&ctx, "#bridge").await,
            Err(CommandError::UserInput(_))
        ));
    }

    #[tokio::test]
    async fn relay_submits_a_privmsg_and_reacts_with_success() {
        let (env, mut request_rx) = test_env();
        let relay = Relay {
            irc: env.irc.clone(),
            emojis: env.emojis.clone(),
        };
        let outbound = Arc::new(RecordingOutbound::default());
        let ctx = context(outbound.clone());

        relay.run(&ctx, "#bridge hello irc").await.unwrap();

        assert!(matches!(
            request_rx.try_recv(),
            Ok(IrcRequest::Privmsg { target, text })
                if target == "#bridge" && text == "hello irc"
        ));
        assert_eq!(outbound.reaction_emojis(), vec!["✅"]);
    }

    #[tokio::test]
    async fn relay_surfaces_a_closed_connection_as_internal() {
        let (env, request_rx) = test_env();
        drop(request_rx);
        let relay = Relay {
            irc: env.irc,
            emojis: env.emojis,
        };
        let outbound = Arc::new(RecordingOutbound::default());
        let ctx = context(outbound);

        assert!(matches!(
            relay.run(&ctx, "#bridge hello").await,
            Err(CommandError::Internal(_))
        ));
    }
}
