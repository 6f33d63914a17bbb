//! TCP side channel.
//!
//! The [`Notifier`] fires a message at a fixed endpoint whenever the puzzle
//! page is reached; the [`Listener`] is the local sink that logs whatever
//! arrives there. Both default to port 5000 on loopback, so out of the box
//! the process notifies itself.

pub mod listener;
pub mod sender;

pub use listener::{Listener, Received, DEFAULT_LISTENER_PORT};
pub use sender::{Notifier, DEFAULT_NOTIFY_HOST, DEFAULT_NOTIFY_PORT};
