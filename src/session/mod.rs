//! Session management module.
//!
//! This module provides the server-held session record, its store, the
//! expiry policy consulted by every gated route, and the clock it runs on.

mod clock;
mod expiry;
mod id;
mod state;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use expiry::{is_expired, SESSION_DURATION_MS};
pub use id::SessionId;
pub use state::SessionState;
pub use store::{Session, SessionStore};
