//! Fitted scaler and regressor bundled for prediction

use crate::data::{FeatureVector, FEATURE_NAMES};
use crate::features::StandardScaler;
use crate::models::gbm::{GbmRegressor, ModelError};

/// Trained sleep score model.
///
/// Holds the scaler and regressor fit on the same column order, so a raw
/// [`FeatureVector`] is always scaled on the basis the regressor was trained
/// with.
#[derive(Debug, Clone)]
pub struct HealthModel {
    scaler: StandardScaler,
    regressor: GbmRegressor,
}

impl HealthModel {
    pub fn new(scaler: StandardScaler, regressor: GbmRegressor) -> Result<Self, ModelError> {
        if !scaler.is_fitted() || !regressor.is_trained() {
            return Err(ModelError::NotTrained);
        }
        if regressor.feature_names().len() != FEATURE_NAMES.len()
            || regressor
                .feature_names()
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(fit, expected)| fit != expected)
        {
            return Err(ModelError::InvalidData(format!(
                "Regressor trained on {:?}, expected {:?}",
                regressor.feature_names(),
                FEATURE_NAMES
            )));
        }

        Ok(Self { scaler, regressor })
    }

    /// Scale raw readings and predict a sleep score
    pub fn predict(&self, current: &FeatureVector) -> Result<f64, ModelError> {
        if !current.is_finite() {
            return Err(ModelError::InvalidData(format!(
                "Non-finite reading in {:?}",
                current
            )));
        }
        let scaled = self.scaler.transform_rows(&[current.to_row()])?;
        self.regressor.predict_one(&scaled[0])
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn regressor(&self) -> &GbmRegressor {
        &self.regressor
    }
}
