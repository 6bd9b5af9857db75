//! Data module for loading sensor recordings
//!
//! This module provides:
//! - CSV loader that merges date and time columns and drops incomplete rows
//! - Observation, feature vector and dataset structures for machine learning

pub mod loader;
pub mod types;

pub use loader::{load_observations, read_observations, LoadError, LoadedData};
pub use types::{test_size, Dataset, FeatureVector, Observation, FEATURE_NAMES, TARGET_NAME};
