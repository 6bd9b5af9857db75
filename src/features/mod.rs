//! Feature engineering module
//!
//! This module provides:
//! - Window transforms (trailing mean, lagged difference)
//! - Derived sensor features for the sleep score model
//! - Standard scaling of feature columns

pub mod engineering;
pub mod scaler;
pub mod window;

pub use engineering::{EngineeredObservation, FeatureConfig, FeatureEngineer};
pub use scaler::{ScalerError, StandardScaler};
