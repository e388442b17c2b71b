//! # Endstop Host Configuration
//!
//! Settings for the host liveness predicate, the dwell between endstop samples,
//! logging, and the simulated endstops exposed by the `endstop-host` binary.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [host]
//! name = "toolchanger"
//! liveness = "require_ready"
//!
//! [wait]
//! bounded_dwell = 0.1
//! continuous_dwell = 1.0
//!
//! [endstops.probe]
//! pin = "!PA1"
//! samples = [true, true, false]
//!
//! [endstops."manual_stepper tool_lock"]
//! pin = "PB4"
//! level = true
//! ```
//!
//! Missing sections fall back to their defaults; `Config::validate` rejects
//! dwell values that are not finite and positive.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::host_os::{HostState, LivenessPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the host, wait timing, logging and endstops.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub endstops: HashMap<String, EndstopConfig>,
}

/// Host-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub liveness: LivenessPolicy,
    #[serde(default = "default_initial_state")]
    pub initial_state: HostState,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: None,
            liveness: LivenessPolicy::default(),
            initial_state: default_initial_state(),
        }
    }
}

/// Dwell between consecutive samples, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaitConfig {
    #[serde(default = "default_bounded_dwell")]
    pub bounded_dwell: f64,
    #[serde(default = "default_continuous_dwell")]
    pub continuous_dwell: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            bounded_dwell: default_bounded_dwell(),
            continuous_dwell: default_continuous_dwell(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parsed max level; unknown names fall back to INFO.
    pub fn max_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// A simulated endstop. `level` and `samples` are raw pin levels; the logical
/// triggered state is the raw level flipped when the endstop is inverted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EndstopConfig {
    pub pin: String,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub level: bool,
    #[serde(default)]
    pub samples: Option<Vec<bool>>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, dwell) in [
            ("bounded_dwell", self.wait.bounded_dwell),
            ("continuous_dwell", self.wait.continuous_dwell),
        ] {
            if !dwell.is_finite() || dwell <= 0.0 {
                return Err(ConfigError::Invalid(format!("wait.{} must be > 0, got {}", key, dwell)));
            }
        }
        for (name, endstop) in &self.endstops {
            if endstop.pin.trim_start_matches('!').is_empty() {
                return Err(ConfigError::Invalid(format!("Endstop '{}' has no pin", name)));
            }
            if matches!(&endstop.samples, Some(samples) if samples.is_empty()) {
                return Err(ConfigError::Invalid(format!("Endstop '{}' has an empty sample script", name)));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_initial_state() -> HostState { HostState::Ready }
fn default_bounded_dwell() -> f64 { 0.1 }
fn default_continuous_dwell() -> f64 { 1.0 }
fn default_log_level() -> String { "info".to_string() }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host.liveness, LivenessPolicy::NotShutdown);
        assert_eq!(config.host.initial_state, HostState::Ready);
        assert_eq!(config.wait.bounded_dwell, 0.1);
        assert_eq!(config.wait.continuous_dwell, 1.0);
        assert_eq!(config.logging.max_level(), tracing::Level::INFO);
        assert!(config.endstops.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("printer.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[host]\nliveness = 'require_ready'\n[wait]\ncontinuous_dwell = 2.5\n[endstops.probe]\npin = '!PA1'\nsamples = [true, false]"
        )
        .unwrap();
        file.flush().unwrap();
        let config = load_config(&file_path).unwrap();
        assert_eq!(config.host.liveness, LivenessPolicy::RequireReady);
        assert_eq!(config.wait.continuous_dwell, 2.5);
        // Defaults for missing fields
        assert_eq!(config.wait.bounded_dwell, 0.1);
        let probe = &config.endstops["probe"];
        assert_eq!(probe.pin, "!PA1");
        assert_eq!(probe.samples.as_deref(), Some(&[true, false][..]));
        assert!(!probe.inverted);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(&file_path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_rejects_non_positive_dwell() {
        let config: Config = toml::from_str("[wait]\nbounded_dwell = 0.0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_sample_script() {
        let config: Config = toml::from_str("[endstops.x]\npin = 'PA0'\nsamples = []").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config: Config = toml::from_str("[logging]\nlevel = 'chatty'").unwrap();
        assert_eq!(config.logging.max_level(), tracing::Level::INFO);
        let config: Config = toml::from_str("[logging]\nlevel = 'trace'").unwrap();
        assert_eq!(config.logging.max_level(), tracing::Level::TRACE);
    }
}
