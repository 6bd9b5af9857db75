//! Presentation of training and prediction results
//!
//! A [`Report`] is rendered in a fixed order: best hyperparameters, test MSE,
//! test R², predicted health score, feature importances, predicted vs actual.

pub mod console;
pub mod html;

use crate::config::ScalingMode;
use crate::data::FeatureVector;
use crate::models::{GbmParams, ModelMetrics};
use serde::Serialize;

pub use html::render_html;

/// Share of total split gain attributed to one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// One held-out sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionPoint {
    pub actual: f64,
    pub predicted: f64,
}

/// Row counts through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_engineered: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub scaling: ScalingMode,
}

/// Everything shown to the user after a run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub best_params: GbmParams,
    pub best_cv_score: f64,
    pub test_metrics: ModelMetrics,
    pub current: FeatureVector,
    pub predicted_score: f64,
    pub feature_importances: Vec<FeatureImportance>,
    pub predictions: Vec<PredictionPoint>,
    pub summary: DataSummary,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Smallest and largest actual value on the test split
    pub fn actual_range(&self) -> Option<(f64, f64)> {
        let mut actuals = self.predictions.iter().map(|p| p.actual);
        let first = actuals.next()?;
        Some(actuals.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sample_report() -> Report {
        Report {
            best_params: GbmParams {
                n_estimators: 200,
                learning_rate: 0.1,
                max_depth: 3,
                ..Default::default()
            },
            best_cv_score: 0.81,
            test_metrics: ModelMetrics {
                mse: 4.0,
                rmse: 2.0,
                mae: 1.5,
                r2: 0.87,
            },
            current: FeatureVector::default(),
            predicted_score: 78.25,
            feature_importances: vec![
                FeatureImportance {
                    feature: "temperature".to_string(),
                    importance: 0.4,
                },
                FeatureImportance {
                    feature: "ecg".to_string(),
                    importance: 0.1,
                },
                FeatureImportance {
                    feature: "pulse".to_string(),
                    importance: 0.3,
                },
                FeatureImportance {
                    feature: "temperature_rolling".to_string(),
                    importance: 0.15,
                },
                FeatureImportance {
                    feature: "ecg_diff".to_string(),
                    importance: 0.05,
                },
            ],
            predictions: vec![
                PredictionPoint {
                    actual: 70.0,
                    predicted: 72.0,
                },
                PredictionPoint {
                    actual: 85.0,
                    predicted: 83.5,
                },
                PredictionPoint {
                    actual: 64.0,
                    predicted: 66.0,
                },
            ],
            summary: DataSummary {
                rows_read: 12,
                rows_dropped: 0,
                rows_engineered: 10,
                train_rows: 7,
                test_rows: 3,
                scaling: ScalingMode::TrainOnly,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_report;

    #[test]
    fn test_actual_range() {
        let report = sample_report();
        assert_eq!(report.actual_range(), Some((64.0, 85.0)));
    }

    #[test]
    fn test_json_fields() {
        let json = sample_report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["best_params"]["n_estimators"], 200);
        assert_eq!(value["predicted_score"], 78.25);
        assert_eq!(value["summary"]["scaling"], "train_only");
        assert_eq!(value["feature_importances"].as_array().unwrap().len(), 5);
    }
}
