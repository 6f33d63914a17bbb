//! # puzzle-gate
//!
//! A session-gated puzzle flow. A visitor logs in with a fixed credential
//! pair, reaches a puzzle page, submits an answer, and on success unlocks a
//! download. Reaching the puzzle page fires a best-effort TCP notification;
//! a local TCP listener started with the process logs whatever arrives.
//!
//! ## Features
//!
//! - **Session store**: server-held login and progress state behind a signed cookie
//! - **Expiry policy**: logins are valid for 24 hours, checked on every gated request
//! - **Side channel**: fire-and-forget notifier plus a logging listener
//!
//! ## Quick Start
//!
//! ```no_run
//! use puzzle_gate::notify::{Listener, Notifier};
//! use puzzle_gate::web::{serve, AppState, GateSettings, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> puzzle_gate::Result<()> {
//!     puzzle_gate::logging::try_init("info").ok();
//!
//!     let listener = Listener::bind("127.0.0.1:5000").await?;
//!     tokio::spawn(listener.run());
//!
//!     let settings = GateSettings::new("alice", "secret", "0700");
//!     let state = AppState::new(settings, Notifier::default());
//!     serve(ServerConfig::default(), state).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod session;
pub mod web;

// Re-export commonly used types
pub use error::{GateError, Result};
pub use notify::{Listener, Notifier};
pub use session::{is_expired, Session, SessionId, SessionState, SessionStore, SESSION_DURATION_MS};
pub use web::{AppState, GateSettings};
