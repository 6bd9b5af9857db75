//! Sleep score prediction from wearable sensor recordings
//!
//! This library loads temperature, ECG and pulse readings, derives a rolling
//! temperature and an ECG difference, and trains a gradient boosting regressor
//! selected by cross-validated grid search to predict a sleep score.
//!
//! # Modules
//!
//! - [`data`] - CSV loading and data structures
//! - [`features`] - Derived features and standard scaling
//! - [`models`] - Regression trees, gradient boosting and grid search
//! - [`report`] - Terminal, JSON and HTML presentation of results
//! - [`pipeline`] - The end-to-end run
//! - [`config`] - TOML configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use health_gbm::config::Config;
//! use health_gbm::data::FeatureVector;
//! use health_gbm::pipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let current = FeatureVector {
//!         temperature: 36.5,
//!         ecg: 0.8,
//!         pulse: 72.0,
//!         temperature_rolling: 36.5,
//!         ecg_diff: 0.1,
//!     };
//!
//!     let result = pipeline::run(&config, &current)?;
//!     println!("{}", result.report);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::Config;
pub use data::{Dataset, FeatureVector, Observation};
pub use features::{FeatureEngineer, StandardScaler};
pub use models::{GbmParams, GbmRegressor, GridSearch, HealthModel, ModelError, ModelMetrics, ParamGrid};
pub use pipeline::{run, PipelineError, PipelineResult};
pub use report::Report;
