//! Analyzer configuration
//!
//! Built once at process start and shared read-only by every session. The
//! smoothing factor and completion cooldown are empirical values kept tunable
//! here rather than hard-coded.

use crate::debounce::DEFAULT_COMPLETION_COOLDOWN_SECS;
use crate::error::AnalysisError;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::smoother::{DEFAULT_SMOOTHING_FACTOR, DEFAULT_VELOCITY_THRESHOLD_DEG};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default target for rep-based exercises when `init` omits one
pub const DEFAULT_TARGET_REPS: u32 = 10;

/// Default target for hold-based exercises (seconds) when `init` omits one
pub const DEFAULT_TARGET_SECONDS: u32 = 30;

/// Tunable parameters of the per-frame analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// EMA weight of the previous smoothed landmark (0 disables smoothing)
    pub smoothing_factor: f64,
    /// Largest accepted single-frame change of a guarded angle (degrees)
    pub velocity_threshold_deg: f64,
    /// Minimum wall-clock gap between two completion events (seconds)
    pub completion_cooldown_secs: f64,
    pub default_target_reps: u32,
    pub default_target_seconds: u32,
    /// Form history entries kept per session
    pub history_limit: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            velocity_threshold_deg: DEFAULT_VELOCITY_THRESHOLD_DEG,
            completion_cooldown_secs: DEFAULT_COMPLETION_COOLDOWN_SECS,
            default_target_reps: DEFAULT_TARGET_REPS,
            default_target_seconds: DEFAULT_TARGET_SECONDS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl AnalyzerConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(0.0..1.0).contains(&self.smoothing_factor) {
            return Err(AnalysisError::Config(format!(
                "smoothing_factor must be in [0, 1), got {}",
                self.smoothing_factor
            )));
        }
        if self.velocity_threshold_deg <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "velocity_threshold_deg must be positive, got {}",
                self.velocity_threshold_deg
            )));
        }
        if self.completion_cooldown_secs < 0.0 {
            return Err(AnalysisError::Config(format!(
                "completion_cooldown_secs must not be negative, got {}",
                self.completion_cooldown_secs
            )));
        }
        if self.default_target_reps == 0 || self.default_target_seconds == 0 {
            return Err(AnalysisError::Config(
                "default targets must be greater than zero".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(AnalysisError::Config(
                "history_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8765";

/// Default cap on one inbound message (1 MiB)
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// WebSocket front-end settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Larger text frames are answered with an error and otherwise ignored
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.smoothing_factor, 0.7);
        assert_eq!(config.velocity_threshold_deg, 30.0);
        assert_eq!(config.completion_cooldown_secs, 2.0);
        assert_eq!(config.default_target_reps, 10);
        assert_eq!(config.default_target_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalyzerConfig::from_json(r#"{"smoothing_factor": 0.5}"#).unwrap();
        assert_eq!(config.smoothing_factor, 0.5);
        assert_eq!(config.velocity_threshold_deg, 30.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AnalyzerConfig::from_json(r#"{"smoothing_factor": 1.0}"#),
            Err(AnalysisError::Config(_))
        ));
        assert!(matches!(
            AnalyzerConfig::from_json(r#"{"velocity_threshold_deg": 0}"#),
            Err(AnalysisError::Config(_))
        ));
        assert!(matches!(
            AnalyzerConfig::from_json(r#"{"default_target_reps": 0}"#),
            Err(AnalysisError::Config(_))
        ));
        assert!(matches!(
            AnalyzerConfig::from_json("not json"),
            Err(AnalysisError::JsonError(_))
        ));
    }

    #[test]
    fn test_roundtrip_file() {
        let path = std::env::temp_dir().join(format!("posture-config-{}.json", std::process::id()));
        let config = AnalyzerConfig {
            completion_cooldown_secs: 3.5,
            ..Default::default()
        };
        fs::write(&path, config.to_json().unwrap()).unwrap();
        let loaded = AnalyzerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8765");
        assert_eq!(config.max_message_bytes, 1024 * 1024);
    }
}
