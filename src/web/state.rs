//! Shared state handed to every route.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::DEFAULT_NOTIFY_MESSAGE;
use crate::notify::Notifier;
use crate::session::{Clock, SessionStore, SystemClock};

/// Fixed values the routes check requests against.
#[derive(Clone)]
pub struct GateSettings {
    pub valid_id: String,
    pub valid_pw: String,
    pub correct_answer: String,
    /// HMAC key for the session cookie.
    pub session_secret: Vec<u8>,
    /// Text sent to the side channel when the puzzle page is reached.
    pub notify_message: String,
    pub views_dir: PathBuf,
    pub public_dir: PathBuf,
    pub download_file: PathBuf,
}

impl GateSettings {
    /// Settings with the given login pair and answer.
    ///
    /// The session secret is random until replaced with
    /// [`with_session_secret`](Self::with_session_secret).
    pub fn new(
        valid_id: impl Into<String>,
        valid_pw: impl Into<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            valid_id: valid_id.into(),
            valid_pw: valid_pw.into(),
            correct_answer: correct_answer.into(),
            session_secret: random_secret(),
            notify_message: DEFAULT_NOTIFY_MESSAGE.to_string(),
            views_dir: PathBuf::from("views"),
            public_dir: PathBuf::from("public"),
            download_file: PathBuf::from("files").join("키케로의 분노.zip"),
        }
    }

    pub fn with_session_secret(mut self, secret: Vec<u8>) -> Self {
        self.session_secret = secret;
        self
    }

    pub fn with_notify_message(mut self, message: impl Into<String>) -> Self {
        self.notify_message = message.into();
        self
    }

    pub fn with_views_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.views_dir = dir.into();
        self
    }

    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    pub fn with_download_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.download_file = file.into();
        self
    }

    /// Exact match on both the identifier and the password.
    pub fn credentials_match(&self, id: &str, pw: &str) -> bool {
        id == self.valid_id && pw == self.valid_pw
    }

    /// Exact match after trimming surrounding whitespace from the submission.
    pub fn answer_matches(&self, answer: &str) -> bool {
        answer.trim() == self.correct_answer
    }
}

impl fmt::Debug for GateSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateSettings")
            .field("valid_id", &"<redacted>")
            .field("valid_pw", &"<redacted>")
            .field("correct_answer", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("notify_message", &self.notify_message)
            .field("views_dir", &self.views_dir)
            .field("public_dir", &self.public_dir)
            .field("download_file", &self.download_file)
            .finish()
    }
}

fn random_secret() -> Vec<u8> {
    let mut secret = Vec::with_capacity(32);
    secret.extend_from_slice(Uuid::new_v4().as_bytes());
    secret.extend_from_slice(Uuid::new_v4().as_bytes());
    secret
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub notifier: Notifier,
    pub clock: Arc<dyn Clock>,
    pub settings: Arc<GateSettings>,
}

impl AppState {
    /// State with an empty store and the system clock.
    pub fn new(settings: GateSettings, notifier: Notifier) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            notifier,
            clock: Arc::new(SystemClock),
            settings: Arc::new(settings),
        }
    }

    /// Replace the clock, e.g. with a [`ManualClock`](crate::session::ManualClock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current time in milliseconds since the epoch.
    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }
}
