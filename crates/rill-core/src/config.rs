//! Engine configuration.
//!
//! Loaded from TOML; every key is optional and falls back to
//! [`EngineConfig::default`]. A missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{Result, SequenceError};

/// Default bound for channels that forward worker output to a subscription.
pub const DEFAULT_WORKER_CHANNEL_CAPACITY: usize = 64;

/// Default cap on concurrently running inner sequences in `flat_map`.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;

/// Tunables shared by every sequence subscribed against an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the bounded channels used by `subscribe_on` and `flat_map`
    pub worker_channel_capacity: usize,
    /// Maximum number of inner sequences `flat_map` drives at once
    pub max_in_flight: usize,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_channel_capacity: DEFAULT_WORKER_CHANNEL_CAPACITY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| SequenceError::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, returning defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SequenceError::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_toml_str(&contents)
    }

    /// Reject values the engine cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.worker_channel_capacity == 0 {
            return Err(SequenceError::config(
                "worker_channel_capacity must be greater than zero",
            ));
        }
        if self.max_in_flight == 0 {
            return Err(SequenceError::config(
                "max_in_flight must be greater than zero",
            ));
        }
        Ok(())
    }
}
