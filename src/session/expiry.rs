//! Session expiry policy.

use super::Session;

/// How long a login stays valid: 24 hours, in milliseconds.
pub const SESSION_DURATION_MS: u64 = 24 * 60 * 60 * 1000;

/// Whether `session` must be treated as expired at `now` (ms since epoch).
///
/// A session that never logged in has no login time and is always expired.
/// The boundary is inclusive: a login exactly `SESSION_DURATION_MS` old is
/// still valid. A clock that went backwards never expires a session.
pub fn is_expired(session: &Session, now: u64) -> bool {
    match session.login_time {
        None => true,
        Some(login_time) => now.saturating_sub(login_time) > SESSION_DURATION_MS,
    }
}
