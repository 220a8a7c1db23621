//! Minimal IRC line protocol support.
//!
//! Covers the slice of RFC 1459 the bridge actually speaks: parsing inbound
//! lines into source/command/params and building the handful of outbound
//! commands the client sends.

/// A parsed IRC protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcLine {
    /// Message source, without the leading ':'.
    pub prefix: Option<String>,
    /// Command name or three-digit numeric reply.
    pub command: String,
    /// Positional parameters, with any trailing parameter last.
    pub params: Vec<String>,
}

impl IrcLine {
    /// Parse one line from the server. Returns `None` for blank or
    /// structurally empty lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return None;
        }

        let mut rest = line;
        let prefix = if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, remainder) = stripped.split_once(' ')?;
            rest = remainder.trim_start();
            Some(prefix.to_string())
        } else {
            None
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };

        let mut parts = head.split_ascii_whitespace();
        let command = parts.next()?.to_string();
        let mut params: Vec<String> = parts.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nickname portion of the source (`nick!user@host`).
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_deref().and_then(|p| p.split('!').next())
    }
}

/// Server reply numerics the client reacts to.
pub mod numerics {
    pub const RPL_WELCOME: &str = "001";
    pub const ERR_ERRONEUSNICKNAME: &str = "432";
    pub const ERR_NICKNAMEINUSE: &str = "433";
    pub const ERR_NOSUCHCHANNEL: &str = "403";
    pub const ERR_TOOMANYCHANNELS: &str = "405";
    pub const ERR_CHANNELISFULL: &str = "471";
    pub const ERR_INVITEONLYCHAN: &str = "473";
    pub const ERR_BANNEDFROMCHAN: &str = "474";
    pub const ERR_BADCHANNELKEY: &str = "475";
}

pub fn nick(name: &str) -> String {
    format!("NICK {}", name)
}

pub fn user(name: &str) -> String {
    format!("USER {} 0 * :{}", name, name)
}

pub fn join(channel: &str) -> String {
    format!("JOIN {}", channel)
}

pub fn privmsg(target: &str, text: &str) -> String {
    format!("PRIVMSG {} :{}", target, text)
}

pub fn pong(token: &str) -> String {
    format!("PONG :{}", token)
}

pub fn quit(message: &str) -> String {
    format!("QUIT :{}", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ping() {
        let line = IrcLine::parse("PING :irc.example.net").unwrap();
        assert_eq!(line.prefix, None);
        assert_eq!(line.command, "PING");
        assert_eq!(line.params, vec!["irc.example.net"]);
    }

    #[test]
    fn parses_prefixed_privmsg_with_trailing() {
        let line = IrcLine::parse(":alice!alice@host PRIVMSG #bridge :hello there").unwrap();
        assert_eq!(line.prefix.as_deref(), Some("alice!alice@host"));
        assert_eq!(line.source_nick(), Some("alice"));
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.params, vec!["#bridge", "hello there"]);
    }

    #[test]
    fn parses_numeric_welcome() {
        let line = IrcLine::parse(":irc.example.net 001 bridgebot :Welcome to IRC").unwrap();
        assert_eq!(line.command, "001");
        assert_eq!(line.params, vec!["bridgebot", "Welcome to IRC"]);
    }

    #[test]
    fn strips_carriage_return() {
        let line = IrcLine::parse("PING :token\r").unwrap();
        assert_eq!(line.params, vec!["token"]);
    }

    #[test]
    fn rejects_empty_lines() {
        assert_eq!(IrcLine::parse(""), None);
        assert_eq!(IrcLine::parse("\r\n"), None);
    }

    #[test]
    fn builds_outbound_lines() {
        assert_eq!(nick("bridgebot"), "NICK bridgebot");
        assert_eq!(user("bridgebot"), "USER bridgebot 0 * :bridgebot");
        assert_eq!(join("#bridge"), "JOIN #bridge");
        assert_eq!(privmsg("#bridge", "hi"), "PRIVMSG #bridge :hi");
        assert_eq!(pong("abc"), "PONG :abc");
        assert_eq!(quit("bye"), "QUIT :bye");
    }
}
