//! Command prefix resolution.

use fancy_regex::Regex;
use uuid::Uuid;

use crate::common::BotIdentity;

/// Decides whether a message opens with (or contains) a recognized command
/// prefix.
///
/// The fallback is a UUID generated once per instance. It is returned when
/// nothing matches so that callers always get a prefix to try; no real
/// message content can ever start with it.
pub struct PrefixResolver {
    configured: Option<String>,
    fallback: String,
}

impl PrefixResolver {
    pub fn new(configured: Option<String>) -> Self {
        Self {
            configured,
            fallback: Uuid::new_v4().to_string(),
        }
    }

    /// The prefix advertised to users: the configured one, or a mention of
    /// the bot when the config leaves it unset.
    pub fn effective_prefix(&self, identity: &BotIdentity) -> String {
        match &self.configured {
            Some(prefix) => prefix.clone(),
            None => format!("@{} ", identity.name),
        }
    }

    /// Every prefix accepted for this message.
    ///
    /// A mention of the bot followed by whitespace is matched first
    /// (nickname form, then raw-id form), then a case-insensitive
    /// occurrence of the effective prefix. With no match the fallback
    /// token is returned as the sole candidate.
    pub fn resolve(&self, content: &str, identity: &BotIdentity) -> Vec<String> {
        let mut prefixes = Vec::new();

        let mention_pattern = format!(r"(<@!{id}>|<@{id}>)\s+", id = identity.id);
        // Built from a numeric ID; always compiles.
        if let Ok(re) = Regex::new(&mention_pattern) {
            if let Ok(Some(found)) = re.find(content) {
                prefixes.push(found.as_str().to_string());
            }
        }

        let effective = self.effective_prefix(identity);
        let prefix_pattern = format!("(?i){}", fancy_regex::escape(&effective));
        if let Ok(re) = Regex::new(&prefix_pattern) {
            if let Ok(Some(found)) = re.find(content) {
                let text = found.as_str().to_string();
                if !prefixes.contains(&text) {
                    prefixes.push(text);
                }
            }
        }

        if prefixes.is_empty() {
            vec![self.fallback.clone()]
        } else {
            prefixes
        }
    }

    #[allow(dead_code)]
    pub fn fallback_prefix(&self) -> &str {
        &self.fallback
    }
}
