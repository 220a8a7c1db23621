//! Discord side of the bridge: connection, prefix resolution, command
//! dispatch, and error reporting.

pub mod bot;
pub mod classify;
pub mod dispatch;
pub mod extensions;
pub mod outbound;
pub mod prefix;

pub use bot::DiscordBot;
