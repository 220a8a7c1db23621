//! IRC side of the bridge.

pub mod client;
pub mod proto;

pub use client::{IrcClient, IrcHandle};
