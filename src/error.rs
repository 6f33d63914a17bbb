//! Error types for puzzle-gate.

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for puzzle-gate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Startup configuration is invalid or incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// Convenience Result type for puzzle-gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
