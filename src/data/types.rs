//! Data types for sensor observations
//!
//! This module defines the core data structures used throughout the project.

use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Model input columns, in the order the scaler and regressor are fit on.
pub const FEATURE_NAMES: [&str; 5] = [
    "temperature",
    "ecg",
    "pulse",
    "temperature_rolling",
    "ecg_diff",
];

/// Name of the regression target column
pub const TARGET_NAME: &str = "sleepscore";

/// One complete sensor reading from the input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Combined `Date` + `Time` of the reading
    pub timestamp: NaiveDateTime,
    /// Body temperature
    pub temperature: f64,
    /// ECG signal value
    pub ecg: f64,
    /// Pulse rate
    pub pulse: f64,
    /// Sleep score (regression target)
    pub sleepscore: f64,
}

/// Model input in the fixed [`FEATURE_NAMES`] order.
///
/// Rows handed to the scaler or the model are only ever built through
/// [`FeatureVector::to_row`], so the column order cannot drift from the one
/// used at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureVector {
    pub temperature: f64,
    pub ecg: f64,
    pub pulse: f64,
    pub temperature_rolling: f64,
    pub ecg_diff: f64,
}

impl FeatureVector {
    /// Build a vector from a slice in [`FEATURE_NAMES`] order. `None` unless
    /// there are exactly five finite values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        if !values.iter().all(|v| v.is_finite()) {
            return None;
        }
        match values {
            [temperature, ecg, pulse, temperature_rolling, ecg_diff] => Some(Self {
                temperature: *temperature,
                ecg: *ecg,
                pulse: *pulse,
                temperature_rolling: *temperature_rolling,
                ecg_diff: *ecg_diff,
            }),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_row().iter().all(|v| v.is_finite())
    }

    /// Flatten into a row in [`FEATURE_NAMES`] order
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.temperature,
            self.ecg,
            self.pulse,
            self.temperature_rolling,
            self.ecg_diff,
        ]
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            temperature: 36.5,
            ecg: 0.8,
            pulse: 72.0,
            temperature_rolling: 36.5,
            ecg_diff: 0.1,
        }
    }
}

/// Dataset for machine learning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature names
    pub feature_names: Vec<String>,
    /// Feature matrix (rows = samples, cols = features)
    pub features: Vec<Vec<f64>>,
    /// Target values
    pub targets: Vec<f64>,
    /// Timestamps for each sample
    pub timestamps: Vec<NaiveDateTime>,
}

impl Dataset {
    /// Create a new empty dataset
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            features: Vec::new(),
            targets: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    /// Create an empty dataset with the standard [`FEATURE_NAMES`] columns
    pub fn with_standard_features() -> Self {
        Self::new(FEATURE_NAMES.iter().map(|s| s.to_string()).collect())
    }

    /// Add a sample to the dataset
    pub fn add_sample(&mut self, features: Vec<f64>, target: f64, timestamp: NaiveDateTime) {
        self.features.push(features);
        self.targets.push(target);
        self.timestamps.push(timestamp);
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Get the number of features
    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Copy out the samples at `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
        }
    }

    /// Same samples with the feature matrix replaced (e.g. after scaling)
    pub fn with_features(&self, features: Vec<Vec<f64>>) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            features,
            targets: self.targets.clone(),
            timestamps: self.timestamps.clone(),
        }
    }

    /// Shuffle with a seeded RNG, then hold out `ceil(len * test_ratio)`
    /// samples as the test set.
    ///
    /// The same dataset and seed always produce the same split.
    pub fn train_test_split_shuffled(&self, test_ratio: f64, seed: u64) -> (Dataset, Dataset) {
        let n = self.len();
        let n_test = test_size(n, test_ratio);
        let n_train = n - n_test;

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train = self.subset(&indices[..n_train]);
        let test = self.subset(&indices[n_train..]);

        (train, test)
    }
}

/// Samples held out for testing: `ceil(n_samples * test_ratio)`, capped at `n_samples`
pub fn test_size(n_samples: usize, test_ratio: f64) -> usize {
    ((n_samples as f64 * test_ratio).ceil() as usize).min(n_samples)
}
