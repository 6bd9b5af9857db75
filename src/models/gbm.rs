//! Gradient Boosting Machine implementation
//!
//! Additive ensemble of [`RegressionTree`]s trained on squared-error residuals,
//! with utilities for prediction, evaluation and feature importance.

use crate::data::Dataset;
use crate::features::ScalerError;
use crate::models::tree::{RegressionTree, SplitGain, TreeParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur with the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Model not trained")]
    NotTrained,

    #[error("Expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Need at least {required} samples, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Scaling failed: {0}")]
    Scaling(#[from] ScalerError),
}

/// GBM hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    /// Minimum samples required in a child node
    pub min_child_weight: f64,
}

impl GbmParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            reg_lambda: self.reg_lambda,
            gamma: self.gamma,
            min_child_weight: self.min_child_weight,
        }
    }
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            reg_lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
        }
    }
}

/// Model evaluation metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// R-squared score
    pub r2: f64,
}

impl ModelMetrics {
    /// Calculate regression metrics; `None` for empty or mismatched inputs
    pub fn regression(y_true: &[f64], y_pred: &[f64]) -> Option<Self> {
        let n = y_true.len();
        if n == 0 || n != y_pred.len() {
            return None;
        }

        let mse = mean_squared_error(y_true, y_pred);
        let mae = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n as f64;

        Some(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2: r2_score(y_true, y_pred),
        })
    }
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination. A constant target scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }

    let mean_true: f64 = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmRegressor {
    params: GbmParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    feature_names: Vec<String>,
    split_gains: Vec<SplitGain>,
}

impl GbmRegressor {
    /// Create a new GBM regressor with default parameters
    pub fn new() -> Self {
        Self::with_params(GbmParams::default())
    }

    /// Create a new GBM regressor with custom parameters
    pub fn with_params(params: GbmParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
            feature_names: Vec::new(),
            split_gains: Vec::new(),
        }
    }

    /// Train the model on a dataset
    pub fn fit(&mut self, dataset: &Dataset) -> Result<(), ModelError> {
        if dataset.is_empty() {
            return Err(ModelError::InvalidData("Empty dataset".to_string()));
        }

        let n_features = dataset.num_features();
        if n_features == 0 {
            return Err(ModelError::InvalidData("No features".to_string()));
        }
        if let Some(row) = dataset.features.iter().find(|r| r.len() != n_features) {
            return Err(ModelError::FeatureMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        if dataset.targets.iter().any(|t| !t.is_finite()) {
            return Err(ModelError::InvalidData("Non-finite target value".to_string()));
        }

        let n_samples = dataset.len();
        debug!(
            "Training GBM regressor with {} samples and {} features ({:?})",
            n_samples, n_features, self.params
        );

        let tree_params = self.params.tree_params();
        let base_score = dataset.targets.iter().sum::<f64>() / n_samples as f64;
        let mut predictions = vec![base_score; n_samples];
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let mut split_gains = vec![SplitGain::default(); n_features];

        for _ in 0..self.params.n_estimators {
            let residuals: Vec<f64> = dataset
                .targets
                .iter()
                .zip(predictions.iter())
                .map(|(t, p)| t - p)
                .collect();

            let tree = RegressionTree::fit(&dataset.features, &residuals, &tree_params);

            for (pred, row) in predictions.iter_mut().zip(dataset.features.iter()) {
                *pred += self.params.learning_rate * tree.predict_one(row);
            }
            for (total, gain) in split_gains.iter_mut().zip(tree.gains()) {
                total.total_gain += gain.total_gain;
                total.splits += gain.splits;
            }

            trees.push(tree);
        }

        self.base_score = base_score;
        self.trees = trees;
        self.split_gains = split_gains;
        self.feature_names = dataset.feature_names.clone();

        Ok(())
    }

    /// Predict a single row
    pub fn predict_one(&self, row: &[f64]) -> Result<f64, ModelError> {
        if !self.is_trained() {
            return Err(ModelError::NotTrained);
        }
        if row.len() != self.feature_names.len() {
            return Err(ModelError::FeatureMismatch {
                expected: self.feature_names.len(),
                actual: row.len(),
            });
        }

        Ok(self.base_score
            + self
                .trees
                .iter()
                .map(|t| self.params.learning_rate * t.predict_one(row))
                .sum::<f64>())
    }

    /// Make predictions on new data
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        features.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Predict on a dataset
    pub fn predict_dataset(&self, dataset: &Dataset) -> Result<Vec<f64>, ModelError> {
        self.predict(&dataset.features)
    }

    /// Evaluate the model on a test dataset
    pub fn evaluate(&self, dataset: &Dataset) -> Result<ModelMetrics, ModelError> {
        let predictions = self.predict_dataset(dataset)?;
        ModelMetrics::regression(&dataset.targets, &predictions)
            .ok_or_else(|| ModelError::InvalidData("Empty evaluation set".to_string()))
    }

    /// Average split gain per feature, normalized to sum to 1.
    /// Features never used for a split get 0.
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let averages: Vec<f64> = self
            .split_gains
            .iter()
            .map(|g| {
                if g.splits > 0 {
                    g.total_gain / g.splits as f64
                } else {
                    0.0
                }
            })
            .collect();
        let total: f64 = averages.iter().sum();

        self.feature_names
            .iter()
            .zip(averages)
            .map(|(name, avg)| {
                let share = if total > 0.0 { avg / total } else { 0.0 };
                (name.clone(), share)
            })
            .collect()
    }

    /// Get model parameters
    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Check if the model is trained
    pub fn is_trained(&self) -> bool {
        !self.feature_names.is_empty()
    }
}

impl Default for GbmRegressor {
    fn default() -> Self {
        Self::new()
    }
}
