//! Standardization of feature columns

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns whose spread is below this are mapped to zero
const MIN_STD: f64 = 1e-10;

#[derive(Error, Debug, PartialEq)]
pub enum ScalerError {
    #[error("Scaler not fitted")]
    NotFitted,

    #[error("Cannot fit scaler on empty data")]
    Empty,

    #[error("Expected {expected} columns, got {actual}")]
    ColumnMismatch { expected: usize, actual: usize },
}

/// Zero-mean, unit-variance scaler (population standard deviation)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Option<Array1<f64>>,
    stds: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn per-column mean and standard deviation
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<(), ScalerError> {
        let means = x.mean_axis(Axis(0)).ok_or(ScalerError::Empty)?;
        let stds = x.std_axis(Axis(0), 0.0);

        self.means = Some(means);
        self.stds = Some(stds);
        Ok(())
    }

    /// Standardize columns with the fitted statistics
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ScalerError> {
        let means = self.means.as_ref().ok_or(ScalerError::NotFitted)?;
        let stds = self.stds.as_ref().ok_or(ScalerError::NotFitted)?;

        if x.ncols() != means.len() {
            return Err(ScalerError::ColumnMismatch {
                expected: means.len(),
                actual: x.ncols(),
            });
        }

        let mut result = Array2::zeros(x.raw_dim());
        for (j, mut col) in result.columns_mut().into_iter().enumerate() {
            let std = stds[j];
            let mean = means[j];
            if std > MIN_STD {
                for (i, val) in col.iter_mut().enumerate() {
                    *val = (x[[i, j]] - mean) / std;
                }
            }
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, ScalerError> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Row-oriented convenience wrapper around [`StandardScaler::transform`]
    pub fn transform_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ScalerError> {
        let x = rows_to_array(rows)?;
        Ok(array_to_rows(&self.transform(&x)?))
    }

    pub fn is_fitted(&self) -> bool {
        self.means.is_some()
    }

    pub fn means(&self) -> Option<&Array1<f64>> {
        self.means.as_ref()
    }

    pub fn stds(&self) -> Option<&Array1<f64>> {
        self.stds.as_ref()
    }
}

/// Pack equally sized rows into a matrix
pub fn rows_to_array(rows: &[Vec<f64>]) -> Result<Array2<f64>, ScalerError> {
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(bad) = rows.iter().find(|r| r.len() != n_cols) {
        return Err(ScalerError::ColumnMismatch {
            expected: n_cols,
            actual: bad.len(),
        });
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat).map_err(|_| ScalerError::ColumnMismatch {
        expected: n_cols,
        actual: 0,
    })
}

pub fn array_to_rows(x: &Array2<f64>) -> Vec<Vec<f64>> {
    x.rows().into_iter().map(|r| r.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_fit_transform_standardizes() {
        let x = array![
            [36.1, 0.8, 60.0],
            [36.4, 0.6, 72.0],
            [36.9, 0.9, 65.0],
            [37.2, 0.7, 80.0],
            [36.6, 0.5, 70.0]
        ];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let means = scaled.mean_axis(Axis(0)).unwrap();
        let stds = scaled.std_axis(Axis(0), 0.0);
        for j in 0..3 {
            assert_abs_diff_eq!(means[j], 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(stds[j], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        assert!(scaled.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_uses_fitted_statistics() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[0.0], [2.0]]).unwrap();

        assert_abs_diff_eq!(scaler.means().unwrap()[0], 1.0);
        assert_abs_diff_eq!(scaler.stds().unwrap()[0], 1.0);

        let out = scaler.transform_rows(&[vec![3.0]]).unwrap();
        assert_abs_diff_eq!(out[0][0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_errors() {
        let scaler = StandardScaler::new();
        assert_eq!(
            scaler.transform(&array![[1.0]]).unwrap_err(),
            ScalerError::NotFitted
        );

        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(ScalerError::ColumnMismatch { expected: 2, actual: 1 })
        ));

        assert!(rows_to_array(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }
}
