//! Engine configuration.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Tunable engine settings. Every field has a clinical default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the enhancement call
    pub enhancement_timeout_ms: u64,
    /// Largest accepted analysis window
    pub max_window_hours: f64,
    /// Changes within ±this percent count as stable
    pub direction_deadband_percent: f64,
    /// |deltaPercent| above this is "rapid"
    pub rapid_velocity_percent: f64,
    /// |deltaPercent| above this is "gradual"
    pub gradual_velocity_percent: f64,
    /// Upper bound on `list_by_patient` page size
    pub max_list_limit: usize,
    /// Identifier stamped on audit exports
    pub system_id: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enhancement_timeout_ms: 8_000,
            max_window_hours: 168.0,
            direction_deadband_percent: 10.0,
            rapid_velocity_percent: 50.0,
            gradual_velocity_percent: 20.0,
            max_list_limit: 500,
            system_id: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the trend bands meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gradual_velocity_percent >= self.rapid_velocity_percent {
            anyhow::bail!("gradual_velocity_percent must be below rapid_velocity_percent");
        }
        if self.direction_deadband_percent < 0.0 || self.max_window_hours <= 0.0 {
            anyhow::bail!("deadband and max window must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"enhancement_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.enhancement_timeout_ms, 250);
        assert_eq!(config.direction_deadband_percent, 10.0);
        assert_eq!(config.rapid_velocity_percent, 50.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"system_id": "ward-7"}}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.system_id.as_deref(), Some("ward-7"));
    }

    #[test]
    fn test_invalid_bands_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"gradual_velocity_percent": 60}}"#).unwrap();

        assert!(EngineConfig::load(file.path()).is_err());
    }
}
