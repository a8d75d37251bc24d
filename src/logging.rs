//! Tracing Infrastructure
//!
//! Installs a `tracing-subscriber` formatter writing to stderr, so stdout
//! stays reserved for command output. The filter comes from `RUST_LOG` when
//! set, otherwise from the configured `log_level`.
//!
//! # Example
//! ```no_run
//! use labinstr::logging::{self, LogFormat};
//!
//! logging::init("debug", LogFormat::Json)?;
//! tracing::info!(device = "psu", "Connected");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, colored when stderr is a terminal
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level.to_lowercase())
            .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e)),
    }
}

/// Initialize the global subscriber.
///
/// Idempotent: if a subscriber is already installed (tests, embedding
/// applications) this returns `Ok(())`.
pub fn init(level: &str, format: LogFormat) -> Result<()> {
    let filter = env_filter(level)?;

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .or_else(|e| {
            // Expected in tests and when an embedding application set one up
            if e.to_string()
                .contains("a global default trace dispatcher has already been set")
            {
                Ok(())
            } else {
                Err(anyhow::anyhow!("Failed to initialize tracing: {}", e))
            }
        })
}
