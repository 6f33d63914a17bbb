//! Session state machine.

use super::{expiry, Session};

/// Where a browser session sits in the login / puzzle flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No successful login yet.
    #[default]
    Anonymous,
    /// Credentials accepted, puzzle not solved.
    LoggedIn,
    /// Puzzle solved; the download is unlocked.
    Answered,
    /// The login is older than the session duration.
    Expired,
}

impl SessionState {
    /// Derive the state of `session` at time `now`.
    pub fn of(session: &Session, now: u64) -> Self {
        if !session.is_logged_in {
            SessionState::Anonymous
        } else if expiry::is_expired(session, now) {
            SessionState::Expired
        } else if session.is_answered {
            SessionState::Answered
        } else {
            SessionState::LoggedIn
        }
    }

    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Anonymous -> LoggedIn
    /// - LoggedIn | Answered -> LoggedIn (login again)
    /// - LoggedIn | Answered -> Answered (answer again)
    /// - LoggedIn | Answered -> Expired
    /// - any -> Anonymous (logout or destruction)
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Anonymous, LoggedIn)
                | (LoggedIn, LoggedIn)
                | (Answered, LoggedIn)
                | (LoggedIn, Answered)
                | (Answered, Answered)
                | (LoggedIn, Expired)
                | (Answered, Expired)
                | (_, Anonymous)
        )
    }

    /// Whether gated pages may be served.
    pub fn is_gated_ok(&self) -> bool {
        matches!(self, SessionState::LoggedIn | SessionState::Answered)
    }

    /// Whether the success page and download are unlocked.
    pub fn is_unlocked(&self) -> bool {
        matches!(self, SessionState::Answered)
    }
}
