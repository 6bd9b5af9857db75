//! Feature engineering for the sleep score model
//!
//! This module appends the derived columns to the loaded observations and
//! turns them into a dataset in [`FEATURE_NAMES`] order.

use crate::data::{Dataset, FeatureVector, Observation, FEATURE_NAMES};
use crate::features::window::{diff, rolling_mean};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Feature engineering configuration
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Window of the trailing temperature mean
    pub rolling_window: usize,
    /// Lag of the ECG difference
    pub diff_lag: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rolling_window: 3,
            diff_lag: 1,
        }
    }
}

/// Observation with its derived columns filled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredObservation {
    pub observation: Observation,
    pub temperature_rolling: f64,
    pub ecg_diff: f64,
}

impl EngineeredObservation {
    /// Model input for this row
    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector {
            temperature: self.observation.temperature,
            ecg: self.observation.ecg,
            pulse: self.observation.pulse,
            temperature_rolling: self.temperature_rolling,
            ecg_diff: self.ecg_diff,
        }
    }
}

/// Feature engineer that derives model inputs from raw observations
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    /// Create a new feature engineer with default configuration
    pub fn new() -> Self {
        Self {
            config: FeatureConfig::default(),
        }
    }

    /// Create a new feature engineer with custom configuration
    pub fn with_config(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Get feature names
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    /// Number of leading rows without a complete set of derived values
    pub fn warmup(&self) -> usize {
        self.config
            .rolling_window
            .saturating_sub(1)
            .max(self.config.diff_lag)
    }

    /// Append rolling temperature and ECG difference, dropping the rows
    /// where either is still warming up
    pub fn build_features(&self, observations: &[Observation]) -> Vec<EngineeredObservation> {
        let temperatures: Vec<f64> = observations.iter().map(|o| o.temperature).collect();
        let ecgs: Vec<f64> = observations.iter().map(|o| o.ecg).collect();

        let rolling = rolling_mean(&temperatures, self.config.rolling_window);
        let diffs = diff(&ecgs, self.config.diff_lag);

        let engineered: Vec<EngineeredObservation> = observations
            .iter()
            .zip(rolling.into_iter().zip(diffs))
            .filter_map(|(obs, derived)| match derived {
                (Some(temperature_rolling), Some(ecg_diff)) => Some(EngineeredObservation {
                    observation: obs.clone(),
                    temperature_rolling,
                    ecg_diff,
                }),
                _ => None,
            })
            .collect();

        info!(
            "Engineered {} rows from {} observations",
            engineered.len(),
            observations.len()
        );

        engineered
    }

    /// Build the feature matrix and `sleepscore` targets
    pub fn build_dataset(&self, rows: &[EngineeredObservation]) -> Dataset {
        let mut dataset = Dataset::new(self.feature_names());

        for row in rows {
            dataset.add_sample(
                row.feature_vector().to_row(),
                row.observation.sleepscore,
                row.observation.timestamp,
            );
        }

        dataset
    }

    /// Feature vector for the most recent reading, computed from the tail of
    /// the history. Returns `None` while the history is shorter than the
    /// warm-up period.
    pub fn current_from_history(&self, history: &[Observation]) -> Option<FeatureVector> {
        let needed = self.warmup() + 1;
        if history.len() < needed {
            return None;
        }

        let tail = &history[history.len() - needed..];
        self.build_features(tail)
            .last()
            .map(EngineeredObservation::feature_vector)
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new()
    }
}
