//! Logging initialization
//!
//! `RUST_LOG` takes precedence over the configured level so a single run can
//! be made more verbose without editing the config file.

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the log filter from `RUST_LOG`, falling back to the configured level
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber
///
/// Returns false if a subscriber was already installed (e.g. by a test
/// harness); the existing subscriber is kept.
pub fn init_logging(config: &LoggingConfig) -> bool {
    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
