//! Logging setup using the tracing ecosystem.
//!
//! The library itself only emits `tracing` events; binaries and demos call
//! [`init`] once to get them printed to stderr.

use tracing::Subscriber;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::error::{Error, Result};

/// Default log filter if `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "sonar_api=info,warn";

/// Installs a global stderr subscriber filtered by `RUST_LOG`.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init() -> Result<()> {
    tracing::subscriber::set_global_default(subscriber(env_filter()))
        .map_err(|e| Error::Unexpected(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Logging initialized");
    Ok(())
}

/// Stderr fmt subscriber gated by `filter`.
pub fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
