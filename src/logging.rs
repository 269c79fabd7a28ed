// Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Lets the filter be swapped after the subscriber is installed
///
/// Logging has to start before the config file is read, so the configured
/// filter is applied afterwards through this handle.
pub struct LogHandle(reload::Handle<EnvFilter, Registry>);

impl LogHandle {
    /// Replace the active filter; returns false if the subscriber is gone
    pub fn apply(&self, config: &LoggingConfig) -> bool {
        self.0.reload(filter_for(config)).is_ok()
    }
}

// `RUST_LOG` wins over the configured filter
fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stdout fmt subscriber
///
/// Returns `None` if a global subscriber was already installed (e.g. by a
/// test harness).
pub fn init(config: &LoggingConfig) -> Option<LogHandle> {
    let (filter, handle) = reload::Layer::new(filter_for(config));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .try_init()
        .ok()?;

    Some(LogHandle(handle))
}
