//! Tracing subscriber setup.
//!
//! The engine itself only emits `tracing` events; binaries call [`init`]
//! once at startup to print them.

use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::errors::{Result, SequenceError};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `config.log_level` is used.
pub fn init(config: &EngineConfig) -> Result<()> {
    init_with_level(&config.log_level)
}

/// Install a global fmt subscriber with `level` as the fallback filter.
pub fn init_with_level(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| SequenceError::config(format!("Invalid log level {level:?}: {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| SequenceError::config(format!("Failed to install tracing subscriber: {e}")))
}
