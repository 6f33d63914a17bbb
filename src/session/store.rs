//! Session storage and management.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use super::{SessionId, SessionState};
use crate::error::GateError;
use crate::Result;

/// Server-held state for one browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// Set only by a successful credential check.
    pub is_logged_in: bool,
    /// Login timestamp in milliseconds since the epoch.
    pub login_time: Option<u64>,
    /// Set only by a correct answer submission.
    pub is_answered: bool,
}

impl Session {
    /// Create an anonymous session.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            is_logged_in: false,
            login_time: None,
            is_answered: false,
        }
    }

    /// Current position in the flow at time `now`.
    pub fn state(&self, now: u64) -> SessionState {
        SessionState::of(self, now)
    }
}

/// Thread-safe storage for sessions.
///
/// Every mutation is a single read-modify-write under the write lock, so
/// concurrent requests on different sessions never observe each other's
/// partial updates.
///
/// There is no background sweep: a record lives until [`destroy`] is
/// called, so anonymous sessions that never log in stay in memory until the
/// process restarts.
///
/// [`destroy`]: SessionStore::destroy
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionStore {
    /// Create a new empty session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Allocate a new anonymous session.
    ///
    /// Returns the newly assigned session ID.
    pub fn create(&self) -> Result<SessionId> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| GateError::LockPoisoned)?;

        let mut id = SessionId::random();
        while sessions.contains_key(&id) {
            id = SessionId::random();
        }

        sessions.insert(id, Session::new(id));
        debug!(session = %id, "session created");
        Ok(id)
    }

    /// Get a snapshot of the session with the given ID.
    pub fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| GateError::LockPoisoned)?;
        Ok(sessions.get(id).cloned())
    }

    /// Check if a session exists.
    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| GateError::LockPoisoned)?;
        Ok(sessions.contains_key(id))
    }

    /// Record a successful login at `now`.
    ///
    /// Resets the answered flag. Returns `false` without doing anything if
    /// the session does not exist.
    pub fn mark_logged_in(&self, id: &SessionId, now: u64) -> Result<bool> {
        self.update(id, |s| {
            s.is_logged_in = true;
            s.login_time = Some(now);
            s.is_answered = false;
        })
    }

    /// Record a correct answer.
    ///
    /// Only logged-in sessions can be marked answered. Returns whether the
    /// flag was set.
    pub fn mark_answered(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| GateError::LockPoisoned)?;

        match sessions.get_mut(id) {
            Some(session) if session.is_logged_in => {
                session.is_answered = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Remove a session entirely.
    ///
    /// Idempotent: returns `false` when there was nothing to remove.
    pub fn destroy(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| GateError::LockPoisoned)?;
        let removed = sessions.remove(id).is_some();
        if removed {
            debug!(session = %id, "session destroyed");
        }
        Ok(removed)
    }

    /// Get the number of sessions in the store.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    fn update<F>(&self, id: &SessionId, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| GateError::LockPoisoned)?;

        match sessions.get_mut(id) {
            Some(session) => {
                f(session);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(session: &Session) {
        if session.is_answered {
            assert!(session.is_logged_in, "answered implies logged in");
        }
        assert_eq!(session.login_time.is_some(), session.is_logged_in);
    }

    #[test]
    fn test_create_session() {
        let store = SessionStore::new();
        let id = store.create().unwrap();

        assert!(store.contains(&id).unwrap());
        assert_eq!(store.count(), 1);

        let session = store.get(&id).unwrap().unwrap();
        assert_eq!(session, Session::new(id));
        assert_invariants(&session);
    }

    #[test]
    fn test_get_nonexistent() {
        let store = SessionStore::new();
        let fake_id = SessionId::from_bytes([7; 16]);

        assert!(store.get(&fake_id).unwrap().is_none());
    }

    #[test]
    fn test_mark_logged_in() {
        let store = SessionStore::new();
        let id = store.create().unwrap();

        assert!(store.mark_logged_in(&id, 42).unwrap());

        let session = store.get(&id).unwrap().unwrap();
        assert!(session.is_logged_in);
        assert_eq!(session.login_time, Some(42));
        assert!(!session.is_answered);
        assert_invariants(&session);
    }

    #[test]
    fn test_mark_logged_in_nonexistent_is_noop() {
        let store = SessionStore::new();
        let fake_id = SessionId::from_bytes([9; 16]);

        assert!(!store.mark_logged_in(&fake_id, 1).unwrap());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_mark_answered_requires_login() {
        let store = SessionStore::new();
        let id = store.create().unwrap();

        assert!(!store.mark_answered(&id).unwrap());
        let session = store.get(&id).unwrap().unwrap();
        assert!(!session.is_answered);
        assert_invariants(&session);

        store.mark_logged_in(&id, 0).unwrap();
        assert!(store.mark_answered(&id).unwrap());
        let session = store.get(&id).unwrap().unwrap();
        assert!(session.is_answered);
        assert_invariants(&session);
    }

    #[test]
    fn test_relogin_resets_answer() {
        let store = SessionStore::new();
        let id = store.create().unwrap();
        store.mark_logged_in(&id, 0).unwrap();
        store.mark_answered(&id).unwrap();

        store.mark_logged_in(&id, 10).unwrap();
        let session = store.get(&id).unwrap().unwrap();
        assert!(!session.is_answered);
        assert_eq!(session.login_time, Some(10));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let store = SessionStore::new();
        let id = store.create().unwrap();

        assert!(store.destroy(&id).unwrap());
        assert!(!store.destroy(&id).unwrap());
        assert!(!store.contains(&id).unwrap());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_destroy_leaves_other_sessions() {
        let store = SessionStore::new();
        let a = store.create().unwrap();
        let b = store.create().unwrap();
        store.mark_logged_in(&b, 5).unwrap();

        store.destroy(&a).unwrap();
        let b_session = store.get(&b).unwrap().unwrap();
        assert!(b_session.is_logged_in);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(SessionStore::new());
        let mut handles = vec![];

        for i in 0..100u64 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let id = store.create().unwrap();
                store.mark_logged_in(&id, i).unwrap();
                if i % 2 == 0 {
                    store.mark_answered(&id).unwrap();
                }
                (id, i)
            }));
        }

        let results: Vec<(SessionId, u64)> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let unique: std::collections::HashSet<_> = results.iter().map(|(id, _)| id).collect();
        assert_eq!(unique.len(), 100);
        assert_eq!(store.count(), 100);

        for (id, i) in results {
            let session = store.get(&id).unwrap().unwrap();
            assert_eq!(session.login_time, Some(i));
            assert_eq!(session.is_answered, i % 2 == 0);
            assert_invariants(&session);
        }
    }
}
