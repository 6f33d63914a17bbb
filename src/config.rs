//! Configuration management for puzzle-gate.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables (including a `.env` file loaded at startup)
//! 3. Configuration file (JSON)
//! 4. Default values
//!
//! The login pair and the puzzle answer have no defaults. Starting without
//! them is a configuration error.

use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cli::Args;
use crate::notify::{Notifier, DEFAULT_LISTENER_PORT, DEFAULT_NOTIFY_HOST, DEFAULT_NOTIFY_PORT};
use crate::web::{GateSettings, ServerConfig};

/// Default text sent to the side channel when the puzzle page is reached.
pub const DEFAULT_NOTIFY_MESSAGE: &str = "0700으로 시작하는 조합";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Web server configuration.
    pub server: ServerSection,
    /// Credentials, answer and cookie key.
    pub auth: AuthSection,
    /// Outbound notification target.
    pub notify: NotifySection,
    /// Inbound diagnostic listener.
    pub listener: ListenerSection,
    /// Filesystem locations.
    pub paths: PathsSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Web server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Stop on Ctrl-C after in-flight requests finish.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Values checked by the login and answer routes.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub valid_id: Option<String>,
    pub valid_pw: Option<String>,
    pub correct_answer: Option<String>,
    /// Key for signing the session cookie. Random per process when unset.
    pub session_secret: Option<String>,
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("AuthSection")
            .field("valid_id", &redact(&self.valid_id))
            .field("valid_pw", &redact(&self.valid_pw))
            .field("correct_answer", &redact(&self.correct_answer))
            .field("session_secret", &redact(&self.session_secret))
            .finish()
    }
}

/// Notification target section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    pub host: String,
    pub port: u16,
    pub message: String,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            host: DEFAULT_NOTIFY_HOST.to_string(),
            port: DEFAULT_NOTIFY_PORT,
            message: DEFAULT_NOTIFY_MESSAGE.to_string(),
        }
    }
}

/// Diagnostic listener section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerSection {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ListenerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_LISTENER_PORT,
        }
    }
}

/// Filesystem locations section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Directory holding `part1.html`, `problem.html` and `success.html`.
    pub views_dir: PathBuf,
    /// Directory served under `/static`.
    pub public_dir: PathBuf,
    /// File served by `/download`.
    pub download_file: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            views_dir: PathBuf::from("views"),
            public_dir: PathBuf::from("public"),
            download_file: PathBuf::from("files").join("키케로의 분노.zip"),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Unparseable ports are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let port_var = |key: &str| var(key).and_then(|v| v.parse::<u16>().ok());

        if let Some(host) = var("GATE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = port_var("PORT") {
            self.server.port = port;
        }

        if let Some(id) = var("VALID_ID") {
            self.auth.valid_id = Some(id);
        }
        if let Some(pw) = var("VALID_PW") {
            self.auth.valid_pw = Some(pw);
        }
        if let Some(answer) = var("CORRECT_ANSWER") {
            self.auth.correct_answer = Some(answer);
        }
        if let Some(secret) = var("SESSION_SECRET") {
            self.auth.session_secret = Some(secret);
        }

        if let Some(host) = var("NOTIFY_HOST") {
            self.notify.host = host;
        }
        if let Some(port) = port_var("NOTIFY_PORT") {
            self.notify.port = port;
        }
        if let Some(message) = var("NOTIFY_MESSAGE") {
            self.notify.message = message;
        }
        if let Some(port) = port_var("LISTENER_PORT") {
            self.listener.port = port;
        }

        if let Some(dir) = var("VIEWS_DIR") {
            self.paths.views_dir = dir.into();
        }
        if let Some(dir) = var("PUBLIC_DIR") {
            self.paths.public_dir = dir.into();
        }
        if let Some(file) = var("DOWNLOAD_FILE") {
            self.paths.download_file = file.into();
        }

        if let Some(level) = var("GATE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(port) = args.notify_port {
            self.notify.port = port;
        }
        if let Some(port) = args.listener_port {
            self.listener.port = port;
        }
        if args.no_listener {
            self.listener.enabled = false;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the web server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host = parse_host(&self.server.host)?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }
        Ok(server_config)
    }

    /// Build the values the routes check against.
    ///
    /// Fails when the login pair or the answer is missing.
    pub fn to_gate_settings(&self) -> Result<GateSettings, ConfigError> {
        let valid_id = required(&self.auth.valid_id, "VALID_ID")?;
        let valid_pw = required(&self.auth.valid_pw, "VALID_PW")?;
        let correct_answer = required(&self.auth.correct_answer, "CORRECT_ANSWER")?;

        let mut settings = GateSettings::new(valid_id, valid_pw, correct_answer)
            .with_notify_message(self.notify.message.clone())
            .with_views_dir(self.paths.views_dir.clone())
            .with_public_dir(self.paths.public_dir.clone())
            .with_download_file(self.paths.download_file.clone());

        match self.auth.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                settings = settings.with_session_secret(secret.as_bytes().to_vec());
            }
            _ => warn!("SESSION_SECRET not set; sessions will not survive a restart"),
        }

        Ok(settings)
    }

    /// The notifier for the configured target.
    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.notify.host.clone(), self.notify.port)
    }

    /// Address for the diagnostic listener, or `None` when disabled.
    pub fn listener_address(&self) -> Result<Option<String>, ConfigError> {
        if !self.listener.enabled {
            return Ok(None);
        }
        let host = parse_host(&self.listener.host)?;
        Ok(Some(format!("{}:{}", host, self.listener.port)))
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn parse_host(host: &str) -> Result<IpAddr, ConfigError> {
    host.parse()
        .map_err(|_| ConfigError::InvalidHost(host.to_string()))
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// A value with no safe default was not provided.
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::Missing(name) => write!(f, "required setting {} is not set", name),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> Config {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            ("VALID_ID", "alice"),
            ("VALID_PW", "pw"),
            ("CORRECT_ANSWER", "cicero"),
        ]));
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.notify.port, 5000);
        assert_eq!(config.listener.port, 5000);
        assert!(config.listener.enabled);
        assert!(config.auth.valid_id.is_none());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080 },
            "auth": { "valid_id": "alice", "valid_pw": "pw", "correct_answer": "0700" },
            "notify": { "port": 6000 }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.valid_id.as_deref(), Some("alice"));
        assert_eq!(config.notify.port, 6000);
        assert_eq!(config.notify.host, "127.0.0.1");
        assert_eq!(config.notify.message, DEFAULT_NOTIFY_MESSAGE);
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ nope").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_apply_env() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            ("PORT", "4000"),
            ("NOTIFY_PORT", "not-a-port"),
            ("LISTENER_PORT", "7000"),
            ("SESSION_SECRET", ""),
            ("DOWNLOAD_FILE", "/srv/prize.zip"),
        ]));

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.notify.port, 5000);
        assert_eq!(config.listener.port, 7000);
        assert!(config.auth.session_secret.is_none());
        assert_eq!(config.paths.download_file, PathBuf::from("/srv/prize.zip"));
    }

    #[test]
    fn test_apply_args_overrides_env() {
        let mut config = Config::default();
        config.apply_env_from(env(&[("PORT", "4000")]));

        let args = Args {
            port: Some(5001),
            no_listener: true,
            log_level: Some("debug".into()),
            ..Args::default()
        };
        config.apply_args(&args);

        assert_eq!(config.server.port, 5001);
        assert!(!config.listener.enabled);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_unset_args_keep_env() {
        let mut config = Config::default();
        config.apply_env_from(env(&[("GATE_HOST", "0.0.0.0")]));
        config.apply_args(&Args::default());
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_missing_required_values() {
        let config = Config::default();
        assert!(matches!(
            config.to_gate_settings(),
            Err(ConfigError::Missing("VALID_ID"))
        ));

        let mut config = Config::default();
        config.apply_env_from(env(&[("VALID_ID", "alice"), ("VALID_PW", "pw")]));
        assert!(matches!(
            config.to_gate_settings(),
            Err(ConfigError::Missing("CORRECT_ANSWER"))
        ));
    }

    #[test]
    fn test_gate_settings() {
        let settings = complete().to_gate_settings().unwrap();
        assert!(settings.credentials_match("alice", "pw"));
        assert!(settings.answer_matches(" cicero "));
    }

    #[test]
    fn test_to_server_config() {
        let server_config = Config::default().to_server_config().unwrap();
        assert_eq!(server_config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();
        assert!(config.to_server_config().is_err());
    }

    #[test]
    fn test_listener_address() {
        let mut config = Config::default();
        assert_eq!(
            config.listener_address().unwrap().as_deref(),
            Some("127.0.0.1:5000")
        );

        config.listener.enabled = false;
        assert!(config.listener_address().unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = complete();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("alice"));
        assert!(!debug.contains("cicero"));
        assert!(debug.contains("<set>"));
    }
}
