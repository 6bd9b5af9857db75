//! Exhaustive hyperparameter search with k-fold cross-validation

use crate::data::Dataset;
use crate::models::gbm::{r2_score, GbmParams, GbmRegressor, ModelError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Hyperparameter values to search over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200, 300],
            learning_rate: vec![0.01, 0.1, 0.2],
            max_depth: vec![3, 5, 7],
        }
    }
}

impl ParamGrid {
    /// Number of combinations
    pub fn len(&self) -> usize {
        self.n_estimators.len() * self.learning_rate.len() * self.max_depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product, `learning_rate` slowest and `n_estimators` fastest.
    /// Parameters outside the grid keep their defaults.
    pub fn combinations(&self) -> Vec<GbmParams> {
        let mut combos = Vec::with_capacity(self.len());
        for &learning_rate in &self.learning_rate {
            for &max_depth in &self.max_depth {
                for &n_estimators in &self.n_estimators {
                    combos.push(GbmParams {
                        n_estimators,
                        learning_rate,
                        max_depth,
                        ..Default::default()
                    });
                }
            }
        }
        combos
    }

    pub fn contains(&self, params: &GbmParams) -> bool {
        self.n_estimators.contains(&params.n_estimators)
            && self.learning_rate.contains(&params.learning_rate)
            && self.max_depth.contains(&params.max_depth)
    }
}

/// Train/validation indices for one fold
#[derive(Debug, Clone, PartialEq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Contiguous, unshuffled k-fold splits. The first `n % k` folds hold one
/// extra sample.
pub fn k_fold(n_samples: usize, n_folds: usize) -> Result<Vec<CvSplit>, ModelError> {
    if n_folds < 2 {
        return Err(ModelError::InvalidData(format!(
            "k-fold needs at least 2 folds, got {}",
            n_folds
        )));
    }
    if n_samples < n_folds {
        return Err(ModelError::InsufficientSamples {
            required: n_folds,
            actual: n_samples,
        });
    }

    let base = n_samples / n_folds;
    let extra = n_samples % n_folds;
    let mut splits = Vec::with_capacity(n_folds);
    let mut start = 0;

    for fold in 0..n_folds {
        let size = base + usize::from(fold < extra);
        let end = start + size;

        splits.push(CvSplit {
            train_indices: (0..start).chain(end..n_samples).collect(),
            test_indices: (start..end).collect(),
        });
        start = end;
    }

    Ok(splits)
}

/// Cross-validated score of one parameter combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: GbmParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    /// Winning combination
    pub best_params: GbmParams,
    /// Mean cross-validated R² of the winner
    pub best_score: f64,
    /// Scores for every combination, in grid order
    pub candidates: Vec<CandidateScore>,
    /// Winner refit on the full training set
    pub model: GbmRegressor,
}

/// Score `params` by R² on each validation fold
pub fn cross_validate(
    dataset: &Dataset,
    params: &GbmParams,
    splits: &[CvSplit],
) -> Result<CandidateScore, ModelError> {
    let mut fold_scores = Vec::with_capacity(splits.len());

    for (i, split) in splits.iter().enumerate() {
        let train = dataset.subset(&split.train_indices);
        let valid = dataset.subset(&split.test_indices);

        let mut model = GbmRegressor::with_params(*params);
        model.fit(&train)?;
        let predictions = model.predict_dataset(&valid)?;
        let score = r2_score(&valid.targets, &predictions);

        debug!(
            "[CV {}/{}] n_estimators={}, learning_rate={}, max_depth={}; score={:.4}",
            i + 1,
            splits.len(),
            params.n_estimators,
            params.learning_rate,
            params.max_depth,
            score
        );
        fold_scores.push(score);
    }

    let n = fold_scores.len() as f64;
    let mean_score = fold_scores.iter().sum::<f64>() / n;
    let std_score = (fold_scores
        .iter()
        .map(|s| (s - mean_score).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    Ok(CandidateScore {
        params: *params,
        fold_scores,
        mean_score,
        std_score,
    })
}

/// Grid search over [`GbmRegressor`] hyperparameters
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    cv_folds: usize,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, cv_folds: usize) -> Self {
        Self { grid, cv_folds }
    }

    /// Evaluate every combination in parallel, pick the highest mean CV
    /// score (earliest in grid order on ties) and refit it on `dataset`.
    pub fn fit(&self, dataset: &Dataset) -> Result<GridSearchResult, ModelError> {
        if self.grid.is_empty() {
            return Err(ModelError::InvalidData("Empty parameter grid".to_string()));
        }

        let splits = k_fold(dataset.len(), self.cv_folds)?;
        let combinations = self.grid.combinations();

        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            splits.len(),
            combinations.len(),
            splits.len() * combinations.len()
        );

        let candidates = combinations
            .par_iter()
            .map(|params| cross_validate(dataset, params, &splits))
            .collect::<Result<Vec<_>, _>>()?;

        let mut best = 0;
        for (i, candidate) in candidates.iter().enumerate().skip(1) {
            if candidate.mean_score > candidates[best].mean_score || candidates[best].mean_score.is_nan() {
                best = i;
            }
        }

        let best_params = candidates[best].params;
        let best_score = candidates[best].mean_score;
        info!("Best parameters: {:?} (mean CV R² {:.4})", best_params, best_score);

        let mut model = GbmRegressor::with_params(best_params);
        model.fit(dataset)?;

        Ok(GridSearchResult {
            best_params,
            best_score,
            candidates,
            model,
        })
    }
}

impl Default for GridSearch {
    fn default() -> Self {
        Self::new(ParamGrid::default(), 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn create_test_dataset(n: usize) -> Dataset {
        let mut dataset = Dataset::new(vec!["x".to_string()]);
        for i in 0..n {
            let x = i as f64;
            dataset.add_sample(vec![x], 3.0 * x + 1.0, NaiveDateTime::default());
        }
        dataset
    }

    #[test]
    fn test_default_grid() {
        let grid = ParamGrid::default();
        let combos = grid.combinations();

        assert_eq!(combos.len(), 27);
        assert_eq!(combos[0].learning_rate, 0.01);
        assert_eq!(combos[0].max_depth, 3);
        assert_eq!(combos[0].n_estimators, 100);
        assert_eq!(combos[1].n_estimators, 200);
        assert_eq!(combos[26].learning_rate, 0.2);
        assert!(combos.iter().all(|p| grid.contains(p)));
    }

    #[test]
    fn test_k_fold_sizes() {
        let splits = k_fold(10, 3).unwrap();

        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(splits[1].test_indices, vec![4, 5, 6]);
        assert_eq!(splits[1].train_indices, vec![0, 1, 2, 3, 7, 8, 9]);

        assert!(k_fold(2, 3).is_err());
        assert!(k_fold(10, 1).is_err());
    }

    #[test]
    fn test_best_params_in_grid() {
        let dataset = create_test_dataset(30);
        let grid = ParamGrid {
            n_estimators: vec![10, 50],
            learning_rate: vec![0.01, 0.3],
            max_depth: vec![2, 4],
        };

        let result = GridSearch::new(grid.clone(), 3).fit(&dataset).unwrap();

        assert_eq!(result.candidates.len(), 8);
        assert!(grid.contains(&result.best_params));
        // Tiny learning rate with few trees barely moves off the mean
        assert!(result.best_params.learning_rate > 0.01);
        assert!(result.model.is_trained());
        assert_eq!(result.model.params(), &result.best_params);
    }

    #[test]
    fn test_cross_validate_scores_each_fold() {
        let dataset = create_test_dataset(12);
        let splits = k_fold(dataset.len(), 3).unwrap();

        let score = cross_validate(&dataset, &GbmParams::default(), &splits).unwrap();
        assert_eq!(score.fold_scores.len(), 3);
        assert!(score.std_score >= 0.0);
    }
}
