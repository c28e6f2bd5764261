//! Configuration for the gesture sentinel.

use crate::core::engine::TargetBounds;
use crate::core::modality::InputType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Decision thresholds per modality. A probability strictly above the
/// threshold is a bot verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub pointer: f64,
    pub touch: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pointer: 0.68,
            touch: 0.62,
        }
    }
}

impl Thresholds {
    /// Threshold for a resolved modality. Unknown uses the pointer value.
    pub fn for_input(&self, input: InputType) -> f64 {
        match input {
            InputType::Touch => self.touch,
            InputType::Mouse | InputType::Unknown => self.pointer,
        }
    }
}

/// Options consumed by the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    /// Keep only every Nth move as a sample
    pub sample_every: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            sample_every: 5,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_every == 0 {
            return Err(ConfigError::Invalid(
                "sample_every must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("pointer", self.thresholds.pointer),
            ("touch", self.thresholds.touch),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} threshold {value} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Main configuration for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,

    /// Bounding box of the protected control
    pub target: Option<TargetBounds>,

    /// Path for exporting gesture reports
    pub export_path: PathBuf,

    /// Path for storing the audit log
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gesture-sentinel");

        Self {
            engine: EngineConfig::default(),
            target: None,
            export_path: data_dir.join("reports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.engine.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gesture-sentinel")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Path of the persisted audit log.
    pub fn audit_log_path(&self) -> PathBuf {
        self.data_path.join("audit.json")
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.thresholds.pointer, 0.68);
        assert_eq!(config.engine.thresholds.touch, 0.62);
        assert_eq!(config.engine.sample_every, 5);
        assert!(config.target.is_none());
    }

    #[test]
    fn test_threshold_selection() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.for_input(InputType::Touch), 0.62);
        assert_eq!(thresholds.for_input(InputType::Mouse), 0.68);
        assert_eq!(thresholds.for_input(InputType::Unknown), 0.68);
    }

    #[test]
    fn test_validation() {
        let mut engine = EngineConfig::default();
        assert!(engine.validate().is_ok());

        engine.sample_every = 0;
        assert!(matches!(engine.validate(), Err(ConfigError::Invalid(_))));

        engine.sample_every = 1;
        engine.thresholds.touch = 1.5;
        assert!(engine.validate().is_err());
    }

    #[test]
    fn test_partial_engine_section_uses_defaults() {
        let engine: EngineConfig = serde_json::from_str(r#"{"sample_every": 2}"#).unwrap();
        assert_eq!(engine.sample_every, 2);
        assert_eq!(engine.thresholds, Thresholds::default());
    }
}
