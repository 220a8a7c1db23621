//! IRC client connection lifecycle.
//!
//! The start sequence is fixed: connect the transport, register the
//! nickname, then join each configured channel in order. Joins share one
//! connection, so they are sequential. After that the client serves the
//! connection: answers PING, surfaces inbound traffic on the event feed,
//! and writes outbound requests submitted through [`IrcHandle`].

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

use crate::common::error::IrcError;
use crate::common::IrcEvent;
use crate::config::types::IrcConfig;
use crate::irc::proto::{self, numerics, IrcLine};

/// Upper bound on one inbound line. The protocol caps lines at 512 bytes
/// but some networks send more.
const MAX_LINE_LENGTH: usize = 4096;

type IrcConnection<S> = Framed<S, LinesCodec>;

/// Outbound requests accepted by a running client.
#[derive(Debug, Clone)]
pub enum IrcRequest {
    /// Send a PRIVMSG to a channel or nick.
    Privmsg { target: String, text: String },
    /// Disconnect with a quit message.
    Quit { message: String },
}

/// Cloneable handle for submitting requests to the IRC connection.
#[derive(Clone)]
pub struct IrcHandle {
    tx: mpsc::UnboundedSender<IrcRequest>,
}

impl IrcHandle {
    pub fn privmsg(&self, target: &str, text: &str) -> Result<(), IrcError> {
        self.tx
            .send(IrcRequest::Privmsg {
                target: target.to_string(),
                text: text.to_string(),
            })
            .map_err(|_| IrcError::ConnectionClosed)
    }

    pub fn quit(&self, message: &str) -> Result<(), IrcError> {
        self.tx
            .send(IrcRequest::Quit {
                message: message.to_string(),
            })
            .map_err(|_| IrcError::ConnectionClosed)
    }

    #[cfg(test)]
    pub(crate) fn test_pair() -> (Self, mpsc::UnboundedReceiver<IrcRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

pub struct IrcClient {
    config: IrcConfig,
    request_rx: mpsc::UnboundedReceiver<IrcRequest>,
    event_tx: mpsc::UnboundedSender<IrcEvent>,
}

impl IrcClient {
    /// Create a client plus the handle and event feed used to talk to it.
    pub fn new(config: IrcConfig) -> (Self, IrcHandle, mpsc::UnboundedReceiver<IrcEvent>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let client = Self {
            config,
            request_rx,
            event_tx,
        };
        (client, IrcHandle { tx: request_tx }, event_rx)
    }

    /// Connect, register, join the configured channels, then serve the
    /// connection until it closes.
    pub async fn start(mut self) -> Result<(), IrcError> {
        let host = self.config.hostname.clone();
        let port = self.config.port;
        info!("Connecting to IRC server at {}:{}", host, port);

        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|source| IrcError::ConnectFailed {
                host: host.clone(),
                port,
                source,
            })?;

        info!("Connected to IRC server");
        self.handle_connection(stream).await
    }

    /// Run the registration/join/serve sequence over an established stream.
    pub async fn handle_connection<S>(&mut self, stream: S) -> Result<(), IrcError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut connection = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

        self.register(&mut connection).await?;

        let channels = self.config.channels.clone();
        for channel in &channels {
            self.join(&mut connection, channel).await?;
        }

        info!("IRC client ready as {}", self.config.name);
        self.serve(&mut connection).await
    }

    async fn register<S>(&self, connection: &mut IrcConnection<S>) -> Result<(), IrcError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let nick = &self.config.name;
        connection.send(proto::nick(nick)).await?;
        connection.send(proto::user(nick)).await?;

        while let Some(line) = connection.next().await {
            let line = line?;
            let Some(parsed) = IrcLine::parse(&line) else {
                continue;
            };
            match parsed.command.as_str() {
                "PING" => self.answer_ping(connection, &parsed).await?,
                numerics::RPL_WELCOME => {
                    let server = parsed
                        .prefix
                        .clone()
                        .unwrap_or_else(|| self.config.hostname.clone());
                    info!("Registered with {} as {}", server, nick);
                    let _ = self.event_tx.send(IrcEvent::Registered { server });
                    return Ok(());
                }
                numerics::ERR_NICKNAMEINUSE | numerics::ERR_ERRONEUSNICKNAME => {
                    return Err(IrcError::RegistrationRejected { reply: line });
                }
                _ => debug!("IRC (pre-registration): {}", line),
            }
        }

        Err(IrcError::ConnectionClosed)
    }

    /// Join one channel and wait for the server to confirm it.
    async fn join<S>(
        &self,
        connection: &mut IrcConnection<S>,
        channel: &str,
    ) -> Result<(), IrcError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        connection.send(proto::join(channel)).await?;

        while let Some(line) = connection.next().await {
            let line = line?;
            let Some(parsed) = IrcLine::parse(&line) else {
                continue;
            };
            match parsed.command.as_str() {
                "PING" => self.answer_ping(connection, &parsed).await?,
                "JOIN" if self.is_own_join(&parsed, channel) => {
                    info!("Joined {}", channel);
                    let _ = self.event_tx.send(IrcEvent::Joined {
                        channel: channel.to_string(),
                    });
                    return Ok(());
                }
                numerics::ERR_NOSUCHCHANNEL
                | numerics::ERR_TOOMANYCHANNELS
                | numerics::ERR_CHANNELISFULL
                | numerics::ERR_INVITEONLYCHAN
                | numerics::ERR_BANNEDFROMCHAN
                | numerics::ERR_BADCHANNELKEY => {
                    return Err(IrcError::JoinRejected {
                        channel: channel.to_string(),
                        reply: line,
                    });
                }
                // Traffic can arrive between joins; surface it as usual.
                _ => self.relay_event(&parsed),
            }
        }

        Err(IrcError::ConnectionClosed)
    }

    fn is_own_join(&self, line: &IrcLine, channel: &str) -> bool {
        line.source_nick() == Some(self.config.name.as_str())
            && line.params.first().map(String::as_str) == Some(channel)
    }

    async fn serve<S>(&mut self, connection: &mut IrcConnection<S>) -> Result<(), IrcError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            tokio::select! {
                line = connection.next() => {
                    match line {
                        Some(Ok(line)) => {
                            let Some(parsed) = IrcLine::parse(&line) else {
                                continue;
                            };
                            if parsed.command == "PING" {
                                self.answer_ping(connection, &parsed).await?;
                            } else {
                                self.relay_event(&parsed);
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            info!("IRC connection closed by remote");
                            return Ok(());
                        }
                    }
                }

                Some(request) = self.request_rx.recv() => {
                    match request {
                        IrcRequest::Privmsg { target, text } => {
                            connection.send(proto::privmsg(&target, &text)).await?;
                        }
                        IrcRequest::Quit { message } => {
                            connection.send(proto::quit(&message)).await?;
                            info!("Sent QUIT, closing IRC connection");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn answer_ping<S>(
        &self,
        connection: &mut IrcConnection<S>,
        line: &IrcLine,
    ) -> Result<(), IrcError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let token = line.params.first().map(String::as_str).unwrap_or_default();
        connection.send(proto::pong(token)).await?;
        Ok(())
    }

    fn relay_event(&self, line: &IrcLine) {
        let sender = line.source_nick().unwrap_or_default().to_string();
        let event = match line.command.as_str() {
            "PRIVMSG" => {
                let (Some(target), Some(text)) = (line.params.first(), line.params.get(1)) else {
                    return;
                };
                IrcEvent::Message {
                    sender,
                    target: target.clone(),
                    text: text.clone(),
                }
            }
            "NOTICE" => {
                let (Some(target), Some(text)) = (line.params.first(), line.params.get(1)) else {
                    return;
                };
                IrcEvent::Notice {
                    sender,
                    target: target.clone(),
                    text: text.clone(),
                }
            }
            _ => {
                debug!("IRC: {} {:?}", line.command, line.params);
                return;
            }
        };

        if self.event_tx.send(event).is_err() {
            warn!("IRC event feed closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    fn test_config(channels: &[&str]) -> IrcConfig {
        IrcConfig {
            hostname: "irc.test".to_string(),
            port: 6667,
            name: "bridgebot".to_string(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn server_connection(stream: DuplexStream) -> Framed<DuplexStream, LinesCodec> {
        Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
    }

    #[tokio::test]
    async fn registers_joins_and_surfaces_messages() {
        let (client_stream, server_stream) = tokio::io::duplex(1024);
        let (mut client, _handle, mut events) = IrcClient::new(test_config(&["#bridge"]));

        let server = tokio::spawn(async move {
            let mut conn = server_connection(server_stream);

            assert_eq!(conn.next().await.unwrap().unwrap(), "NICK bridgebot");
            assert_eq!(
                conn.next().await.unwrap().unwrap(),
                "USER bridgebot 0 * :bridgebot"
            );
            conn.send(":irc.test 001 bridgebot :Welcome".to_string())
                .await
                .unwrap();

            assert_eq!(conn.next().await.unwrap().unwrap(), "JOIN #bridge");
            conn.send(":bridgebot!bridgebot@host JOIN #bridge".to_string())
                .await
                .unwrap();

            conn.send(":alice!alice@host PRIVMSG #bridge :hello".to_string())
                .await
                .unwrap();
            // Dropping the connection ends the client's serve loop.
        });

        let result = client.handle_connection(client_stream).await;
        server.await.unwrap();
        assert!(result.is_ok());

        assert!(matches!(
            events.recv().await,
            Some(IrcEvent::Registered { server }) if server == "irc.test"
        ));
        assert!(matches!(
            events.recv().await,
            Some(IrcEvent::Joined { channel }) if channel == "#bridge"
        ));
        assert!(matches!(
            events.recv().await,
            Some(IrcEvent::Message { sender, target, text })
                if sender == "alice" && target == "#bridge" && text == "hello"
        ));
    }

    #[tokio::test]
    async fn joins_channels_in_configured_order() {
        let (client_stream, server_stream) = tokio::io::duplex(1024);
        let (mut client, _handle, _events) = IrcClient::new(test_config(&["#first", "#second"]));

        let server = tokio::spawn(async move {
            let mut conn = server_connection(server_stream);

            conn.next().await.unwrap().unwrap();
            conn.next().await.unwrap().unwrap();
            conn.send(":irc.test 001 bridgebot :Welcome".to_string())
                .await
                .unwrap();

            assert_eq!(conn.next().await.unwrap().unwrap(), "JOIN #first");
            conn.send(":bridgebot!b@h JOIN #first".to_string())
                .await
                .unwrap();
            assert_eq!(conn.next().await.unwrap().unwrap(), "JOIN #second");
            conn.send(":bridgebot!b@h JOIN #second".to_string())
                .await
                .unwrap();
        });

        let result = client.handle_connection(client_stream).await;
        server.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn answers_ping_during_registration() {
        let (client_stream, server_stream) = tokio::io::duplex(1024);
        let (mut client, _handle, _events) = IrcClient::new(test_config(&[]));

        let server = tokio::spawn(async move {
            let mut conn = server_connection(server_stream);

            conn.next().await.unwrap().unwrap();
            conn.next().await.unwrap().unwrap();
            conn.send("PING :abc123".to_string()).await.unwrap();
            assert_eq!(conn.next().await.unwrap().unwrap(), "PONG :abc123");
            conn.send(":irc.test 001 bridgebot :Welcome".to_string())
                .await
                .unwrap();
        });

        let result = client.handle_connection(client_stream).await;
        server.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn nickname_in_use_fails_startup() {
        let (client_stream, server_stream) = tokio::io::duplex(1024);
        let (mut client, _handle, _events) = IrcClient::new(test_config(&["#bridge"]));

        let server = tokio::spawn(async move {
            let mut conn = server_connection(server_stream);

            conn.next().await.unwrap().unwrap();
            conn.next().await.unwrap().unwrap();
            conn.send(":irc.test 433 * bridgebot :Nickname is already in use".to_string())
                .await
                .unwrap();
        });

        let result = client.handle_connection(client_stream).await;
        server.await.unwrap();
        assert!(matches!(result, Err(IrcError::RegistrationRejected { .. })));
    }

    #[tokio::test]
    async fn handle_requests_are_written_out() {
        let (client_stream, server_stream) = tokio::io::duplex(1024);
        let (mut client, handle, _events) = IrcClient::new(test_config(&[]));

        let server = tokio::spawn(async move {
            let mut conn = server_connection(server_stream);

            conn.next().await.unwrap().unwrap();
            conn.next().await.unwrap().unwrap();
            conn.send(":irc.test 001 bridgebot :Welcome".to_string())
                .await
                .unwrap();

            assert_eq!(
                conn.next().await.unwrap().unwrap(),
                "PRIVMSG #bridge :from discord"
            );
            assert_eq!(conn.next().await.unwrap().unwrap(), "QUIT :shutting down");
        });

        handle.privmsg("#bridge", "from discord").unwrap();
        handle.quit("shutting down").unwrap();

        let result = client.handle_connection(client_stream).await;
        server.await.unwrap();
        assert!(result.is_ok());
    }
}
