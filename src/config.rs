//! Configuration management
//!
//! Every field has a default, so a partial TOML file (or none at all) is a
//! valid configuration.

use crate::data::FeatureVector;
use crate::models::ParamGrid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Input data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("MediSync Data.csv"),
        }
    }
}

/// Which rows the scaler statistics are computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Fit on the training partition only
    TrainOnly,
    /// Fit on every row before splitting
    FullDataset,
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_ratio: f64,
    pub seed: u64,
    pub cv_folds: usize,
    pub scaling: ScalingMode,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.3,
            seed: 42,
            cv_folds: 3,
            scaling: ScalingMode::TrainOnly,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub grid: ParamGrid,
    pub current: FeatureVector,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults (with a
    /// warning) when it cannot be read or parsed
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            warn!("Using default configuration, {:?} not loaded: {}", path, e);
            Self::default()
        })
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.training.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_ratio must be in (0, 1), got {}",
                ratio
            )));
        }
        if self.training.cv_folds < 2 {
            return Err(ConfigError::Invalid(format!(
                "cv_folds must be at least 2, got {}",
                self.training.cv_folds
            )));
        }
        if !self.current.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "current observation must be finite, got {:?}",
                self.current
            )));
        }
        if self.grid.is_empty() {
            return Err(ConfigError::Invalid("parameter grid is empty".to_string()));
        }
        Ok(())
    }
}
