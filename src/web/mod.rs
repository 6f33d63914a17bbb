//! Web layer for puzzle-gate.
//!
//! ## Routes
//!
//! - `GET /` - Login page
//! - `POST /login` - Check `id` / `pw`
//! - `GET /problem` - Send the side-channel notification, go to the puzzle
//! - `GET /problem-page` - Puzzle page
//! - `POST /submit-answer` - Check `answer`
//! - `GET /success` - Shown once the puzzle is solved
//! - `GET /download` - The prize file, once the puzzle is solved
//! - `GET /logout` - Destroy the session
//! - `GET /expired` - Access blocked page
//! - `GET /static/*` - Files from the public directory
//!
//! ## Example
//!
//! ```no_run
//! use puzzle_gate::notify::Notifier;
//! use puzzle_gate::web::{serve, AppState, GateSettings, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> puzzle_gate::Result<()> {
//!     let settings = GateSettings::new("alice", "secret", "0700");
//!     let state = AppState::new(settings, Notifier::default());
//!     serve(ServerConfig::new("127.0.0.1", 3000), state).await
//! }
//! ```

pub mod cookies;
pub mod handlers;
pub mod pages;
pub mod router;
pub mod state;
pub mod types;

pub use router::{create_router, serve, ServerConfig};
pub use state::{AppState, GateSettings};
