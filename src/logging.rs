//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by the subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise the crate logs at `level`,
/// e.g. `puzzle_gate=info`.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("puzzle_gate={level},tower_http={level}")))
}

/// Initialize the logging system at the given level.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Err` if logging has already been initialized.
pub fn try_init(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}
