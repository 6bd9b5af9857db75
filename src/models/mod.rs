//! Machine learning models module
//!
//! This module provides:
//! - Regression trees fit to boosting residuals
//! - Gradient Boosting regressor
//! - Cross-validated grid search
//! - The fitted scaler + regressor bundle used for prediction

pub mod gbm;
pub mod health;
pub mod search;
pub mod tree;

pub use gbm::{GbmParams, GbmRegressor, ModelError, ModelMetrics};
pub use health::HealthModel;
pub use search::{k_fold, CandidateScore, GridSearch, GridSearchResult, ParamGrid};
