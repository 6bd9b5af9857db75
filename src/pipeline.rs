//! End-to-end run: load, engineer, scale, split, search, evaluate, predict

use crate::config::{Config, ConfigError, ScalingMode, TrainingConfig};
use crate::data::{load_observations, test_size, FeatureVector, LoadError, LoadedData};
use crate::features::scaler::rows_to_array;
use crate::features::{FeatureEngineer, ScalerError, StandardScaler};
use crate::models::{GridSearch, HealthModel, ModelError, ModelMetrics};
use crate::report::{DataSummary, FeatureImportance, PredictionPoint, Report};
use thiserror::Error;
use tracing::info;

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Scaling(#[from] ScalerError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Only {rows} usable rows after feature engineering; at least {required} are needed")]
    InsufficientRows { rows: usize, required: usize },
}

/// Output of a run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub report: Report,
    pub model: HealthModel,
}

/// Run the full pipeline on the configured input file
pub fn run(config: &Config, current: &FeatureVector) -> Result<PipelineResult, PipelineError> {
    let loaded = load_observations(&config.data.path)?;
    run_on_observations(&loaded, config, current)
}

/// Run everything after loading
pub fn run_on_observations(
    loaded: &LoadedData,
    config: &Config,
    current: &FeatureVector,
) -> Result<PipelineResult, PipelineError> {
    config.validate()?;
    let training = &config.training;

    let engineer = FeatureEngineer::new();
    let rows = engineer.build_features(&loaded.observations);
    let dataset = engineer.build_dataset(&rows);

    let required = minimum_rows(training);
    if dataset.len() < required {
        return Err(PipelineError::InsufficientRows {
            rows: dataset.len(),
            required,
        });
    }

    let (train_raw, test_raw) = dataset.train_test_split_shuffled(training.test_ratio, training.seed);

    let mut scaler = StandardScaler::new();
    match training.scaling {
        ScalingMode::TrainOnly => scaler.fit(&rows_to_array(&train_raw.features)?)?,
        ScalingMode::FullDataset => scaler.fit(&rows_to_array(&dataset.features)?)?,
    }
    let train = train_raw.with_features(scaler.transform_rows(&train_raw.features)?);
    let test = test_raw.with_features(scaler.transform_rows(&test_raw.features)?);

    info!(
        "Split {} rows into {} train / {} test (seed {}, scaler fit on {:?})",
        dataset.len(),
        train.len(),
        test.len(),
        training.seed,
        training.scaling
    );

    let search = GridSearch::new(config.grid.clone(), training.cv_folds).fit(&train)?;

    let test_predictions = search.model.predict_dataset(&test)?;
    let test_metrics = ModelMetrics::regression(&test.targets, &test_predictions)
        .ok_or_else(|| ModelError::InvalidData("Empty test split".to_string()))?;
    info!("Test MSE {:.4}, R² {:.4}", test_metrics.mse, test_metrics.r2);

    let model = HealthModel::new(scaler, search.model)?;
    let feature_importances = model
        .regressor()
        .feature_importances()
        .into_iter()
        .map(|(feature, importance)| FeatureImportance { feature, importance })
        .collect();

    let predicted_score = model.predict(current)?;
    info!("Predicted health score {:.2} for {:?}", predicted_score, current);

    let report = Report {
        best_params: search.best_params,
        best_cv_score: search.best_score,
        test_metrics,
        current: *current,
        predicted_score,
        feature_importances,
        predictions: test
            .targets
            .iter()
            .zip(test_predictions)
            .map(|(&actual, predicted)| PredictionPoint { actual, predicted })
            .collect(),
        summary: DataSummary {
            rows_read: loaded.rows_read,
            rows_dropped: loaded.rows_dropped,
            rows_engineered: dataset.len(),
            train_rows: train.len(),
            test_rows: test.len(),
            scaling: training.scaling,
        },
    };

    Ok(PipelineResult { report, model })
}

/// Fewest engineered rows that leave at least one test row and one training
/// row per CV fold
pub fn minimum_rows(training: &TrainingConfig) -> usize {
    (1..=usize::from(u16::MAX))
        .find(|&n| {
            let n_test = test_size(n, training.test_ratio);
            n_test >= 1 && n - n_test >= training.cv_folds
        })
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;
    use crate::models::ParamGrid;
    use chrono::NaiveDate;

    fn observations(n: usize) -> LoadedData {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let observations = (0..n)
            .map(|i| Observation {
                timestamp: start + chrono::Duration::minutes(i as i64),
                temperature: 36.0 + i as f64 * 0.05,
                ecg: 0.4 + i as f64 * 0.02,
                pulse: 55.0 + i as f64,
                sleepscore: 60.0 + i as f64 * 1.5,
            })
            .collect();

        LoadedData {
            observations,
            rows_read: n,
            rows_dropped: 0,
        }
    }

    fn small_config() -> Config {
        Config {
            grid: ParamGrid {
                n_estimators: vec![20, 50],
                learning_rate: vec![0.1, 0.3],
                max_depth: vec![2, 3],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_minimum_rows() {
        // n = 5: ceil(1.5) = 2 test, 3 train
        assert_eq!(minimum_rows(&TrainingConfig::default()), 5);
    }

    #[test]
    fn test_insufficient_rows() {
        let err = run_on_observations(&observations(5), &small_config(), &FeatureVector::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientRows { rows: 3, required: 5 }));
    }

    #[test]
    fn test_summary_counts() {
        let result =
            run_on_observations(&observations(30), &small_config(), &FeatureVector::default()).unwrap();
        let summary = &result.report.summary;

        assert_eq!(summary.rows_engineered, 28);
        assert_eq!(summary.test_rows, 9);
        assert_eq!(summary.train_rows, 19);
        assert_eq!(result.report.predictions.len(), 9);
        assert!(small_config().grid.contains(&result.report.best_params));
    }

    #[test]
    fn test_full_dataset_scaling_mode() {
        let mut config = small_config();
        config.training.scaling = ScalingMode::FullDataset;

        let result =
            run_on_observations(&observations(30), &config, &FeatureVector::default()).unwrap();
        let means = result.model.scaler().means().unwrap();

        // Pulse runs 57..=84 over the engineered rows
        assert!((means[2] - 70.5).abs() < 1e-9);
        assert_eq!(result.report.summary.scaling, ScalingMode::FullDataset);
    }
}
