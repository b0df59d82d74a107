//! Session configuration, loadable from a YAML file.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::{DEFAULT_TIMEOUT_MS, RESET_INTERVAL_MS};

/// ```yaml
/// port: /dev/ttyACM0
/// timeout_ms: 500
/// reset_interval_ms: 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BadgeConfig {
    /// Serial port name, first available port when unset
    pub port: Option<String>,
    /// Read timeout for a single response
    pub timeout_ms: u64,
    /// Pause between reset attempts
    pub reset_interval_ms: u64,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        BadgeConfig {
            port: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reset_interval_ms: RESET_INTERVAL_MS,
        }
    }
}

impl BadgeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let raw = std::fs::read_to_string(p)
            .with_context(|| format!("reading config {}", p.display()))?;
        let config =
            Self::from_yaml(&raw).with_context(|| format!("parsing config {}", p.display()))?;
        log::debug!("Loaded config from {}: {:?}", p.display(), config);
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: BadgeConfig = serde_yaml::from_str(raw)?;
        anyhow::ensure!(config.timeout_ms > 0, "timeout_ms must be greater than 0");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reset_interval(&self) -> Duration {
        Duration::from_millis(self.reset_interval_ms)
    }
}
