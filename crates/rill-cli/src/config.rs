//! `rill.toml` handling.

use anyhow::{ensure, Context, Result};
use rill_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the `rill` binary: engine tunables plus scenario knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Engine configuration, read from the top level of the file
    #[serde(flatten)]
    pub engine: EngineConfig,
    /// Attach a `log` stage to every scenario pipeline
    pub log_signals: bool,
    /// Period of the `interval` scenario, in milliseconds
    pub interval_period_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            log_signals: false,
            interval_period_ms: 1000,
        }
    }
}

impl CliConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.engine.validate()?;
        ensure!(
            config.interval_period_ms > 0,
            "interval_period_ms must be greater than zero"
        );
        Ok(config)
    }

    /// Period of the `interval` scenario.
    pub fn interval_period(&self) -> Duration {
        Duration::from_millis(self.interval_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("rill.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_keys_read_from_top_level() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "worker_channel_capacity = 16\nlog_signals = true\ninterval_period_ms = 250"
        )
        .unwrap();

        let config = CliConfig::load(file.path()).unwrap();
        assert_eq!(config.engine.worker_channel_capacity, 16);
        assert!(config.log_signals);
        assert_eq!(config.interval_period(), Duration::from_millis(250));
        assert_eq!(config.engine.log_level, "info");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(CliConfig::parse("worker_channel_capacity = 0").is_err());
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(CliConfig::parse("interval_period_ms = 0").is_err());
    }

    #[test]
    fn test_malformed_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_signals = \"sometimes\"").unwrap();
        assert!(CliConfig::load(file.path()).is_err());
    }
}
