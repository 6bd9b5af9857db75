//! Regression tree fit to boosting residuals
//!
//! Squared-error loss has unit hessian per sample, so the Newton leaf weight
//! reduces to `sum(residual) / (count + lambda)` and a split's gain is
//! `½·(G_L²/(n_L+λ) + G_R²/(n_R+λ) − G²/(n+λ)) − γ`.

use serde::{Deserialize, Serialize};

/// Growth limits and regularization for a single tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0)
    pub max_depth: usize,
    /// L2 penalty on leaf weights
    pub reg_lambda: f64,
    /// Minimum gain required to keep a split
    pub gamma: f64,
    /// Minimum number of samples in each child
    pub min_child_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Split statistics for one feature, summed over a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitGain {
    pub total_gain: f64,
    pub splits: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Binary regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Node,
    gains: Vec<SplitGain>,
}

impl RegressionTree {
    /// Fit a tree mapping `features` rows to `residuals`
    pub fn fit(features: &[Vec<f64>], residuals: &[f64], params: &TreeParams) -> Self {
        let n_features = features.first().map(Vec::len).unwrap_or(0);
        let mut builder = Builder {
            features,
            residuals,
            params,
            gains: vec![SplitGain::default(); n_features],
        };

        let indices: Vec<usize> = (0..residuals.len()).collect();
        let root = builder.grow(&indices, 0);

        Self {
            root,
            gains: builder.gains,
        }
    }

    /// Leaf weight reached by `row`
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { weight } => return *weight,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Per-feature split gain, indexed like the input columns
    pub fn gains(&self) -> &[SplitGain] {
        &self.gains
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }

    pub fn n_leaves(&self) -> usize {
        fn leaves(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        leaves(&self.root)
    }
}

struct Builder<'a> {
    features: &'a [Vec<f64>],
    residuals: &'a [f64],
    params: &'a TreeParams,
    gains: Vec<SplitGain>,
}

impl Builder<'_> {
    fn grow(&mut self, indices: &[usize], depth: usize) -> Node {
        let sum: f64 = indices.iter().map(|&i| self.residuals[i]).sum();
        let leaf = Node::Leaf {
            weight: sum / (indices.len() as f64 + self.params.reg_lambda),
        };

        if depth >= self.params.max_depth || indices.len() < 2 {
            return leaf;
        }

        match self.find_best_split(indices, sum) {
            Some(split) => {
                let stats = &mut self.gains[split.feature];
                stats.total_gain += split.gain;
                stats.splits += 1;

                let left = self.grow(&split.left, depth + 1);
                let right = self.grow(&split.right, depth + 1);

                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => leaf,
        }
    }

    fn score(&self, grad_sum: f64, count: usize) -> f64 {
        grad_sum * grad_sum / (count as f64 + self.params.reg_lambda)
    }

    fn find_best_split(&self, indices: &[usize], total: f64) -> Option<BestSplit> {
        let n = indices.len();
        let n_features = self.features.first().map(Vec::len).unwrap_or(0);
        let parent_score = self.score(total, n);
        let min_child = self.params.min_child_weight.max(1.0).ceil() as usize;

        let mut best: Option<(usize, f64, f64)> = None;

        for feature in 0..n_features {
            let mut sorted: Vec<usize> = indices.to_vec();
            sorted.sort_by(|&a, &b| self.features[a][feature].total_cmp(&self.features[b][feature]));

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += self.residuals[sorted[k]];

                let here = self.features[sorted[k]][feature];
                let next = self.features[sorted[k + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_child || n_right < min_child {
                    continue;
                }

                let gain = 0.5
                    * (self.score(left_sum, n_left) + self.score(total - left_sum, n_right) - parent_score)
                    - self.params.gamma;

                if gain > best.map(|(_, _, g)| g).unwrap_or(0.0) {
                    best = Some((feature, (here + next) / 2.0, gain));
                }
            }
        }

        best.map(|(feature, threshold, gain)| {
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| self.features[i][feature] <= threshold);
            BestSplit {
                feature,
                threshold,
                gain,
                left,
                right,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            reg_lambda: 0.0,
            gamma: 0.0,
            min_child_weight: 1.0,
        }
    }

    #[test]
    fn test_step_function() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let residuals: Vec<f64> = (0..10).map(|i| if i < 5 { -1.0 } else { 1.0 }).collect();

        let tree = RegressionTree::fit(&features, &residuals, &params(1));

        assert_eq!(tree.depth(), 1);
        assert_relative_eq!(tree.predict_one(&[2.0]), -1.0);
        assert_relative_eq!(tree.predict_one(&[7.0]), 1.0);
        assert_eq!(tree.gains()[0].splits, 1);
    }

    #[test]
    fn test_depth_limit() {
        let features: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let residuals: Vec<f64> = (0..32).map(|i| i as f64).collect();

        let tree = RegressionTree::fit(&features, &residuals, &params(3));

        assert!(tree.depth() <= 3);
        assert!(tree.n_leaves() <= 8);
    }

    #[test]
    fn test_lambda_shrinks_leaves() {
        let features = vec![vec![0.0], vec![0.0]];
        let residuals = vec![2.0, 2.0];
        let p = TreeParams {
            reg_lambda: 2.0,
            ..params(3)
        };

        let tree = RegressionTree::fit(&features, &residuals, &p);

        // No split possible on identical values: single leaf of 4 / (2 + 2)
        assert_eq!(tree.n_leaves(), 1);
        assert_relative_eq!(tree.predict_one(&[0.0]), 1.0);
    }

    #[test]
    fn test_picks_informative_feature() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![((i * 7) % 5) as f64, i as f64])
            .collect();
        let residuals: Vec<f64> = (0..20).map(|i| if i < 10 { 0.0 } else { 5.0 }).collect();

        let tree = RegressionTree::fit(&features, &residuals, &params(1));

        assert_eq!(tree.gains()[0].splits, 0);
        assert_eq!(tree.gains()[1].splits, 1);
    }
}
