//! Gradient boosted regression trees with second-order split scoring
//!
//! Squared-error loss gives grad = pred - y and hess = 1 per row. Each tree is
//! grown greedily with
//! - leaf weight w* = -G / (H + lambda)
//! - split gain 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)] - γ
//! - per-tree row and column subsampling from one seeded generator

use crate::error::{AutoPriceError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Booster hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterConfig {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Minimum hessian sum per child
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    /// Row sampling ratio per tree
    pub subsample: f64,
    /// Column sampling ratio per tree
    pub colsample_bytree: f64,
    pub random_state: u64,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            n_estimators: 1000,
            learning_rate: 0.05,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            subsample: 0.8,
            colsample_bytree: 0.8,
            random_state: 42,
        }
    }
}

impl BoosterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_subsample(mut self, ratio: f64) -> Self {
        self.subsample = ratio;
        self
    }

    pub fn with_colsample_bytree(mut self, ratio: f64) -> Self {
        self.colsample_bytree = ratio;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Reject values the booster cannot train with
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(AutoPriceError::ConfigError("n_estimators must be positive".to_string()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(AutoPriceError::ConfigError("learning_rate must be positive".to_string()));
        }
        for (name, ratio) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(AutoPriceError::ConfigError(format!("{} must be in (0, 1], got {}", name, ratio)));
            }
        }
        if self.reg_lambda < 0.0 || self.gamma < 0.0 || self.min_child_weight < 0.0 {
            return Err(AutoPriceError::ConfigError(
                "reg_lambda, gamma and min_child_weight must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf { weight: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, sample: &ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { weight } => return *weight,
                TreeNode::Split { feature, threshold, left, right } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn count_splits(&self, counts: &mut [f64]) {
        if let TreeNode::Split { feature, left, right, .. } = self {
            if let Some(c) = counts.get_mut(*feature) {
                *c += 1.0;
            }
            left.count_splits(counts);
            right.count_splits(counts);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    grad: &'a Array1<f64>,
    hess: &'a Array1<f64>,
    features: &'a [usize],
    config: &'a BoosterConfig,
}

impl TreeBuilder<'_> {
    fn build(&self, indices: &[usize], depth: usize) -> TreeNode {
        let g_sum: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h_sum: f64 = indices.iter().map(|&i| self.hess[i]).sum();
        let weight = -g_sum / (h_sum + self.config.reg_lambda);

        if depth >= self.config.max_depth || indices.len() < 2 || h_sum < self.config.min_child_weight {
            return TreeNode::Leaf { weight };
        }

        // Scan features in parallel, then pick sequentially so ties resolve
        // to the lowest feature index regardless of scheduling.
        let candidates: Vec<SplitCandidate> = self
            .features
            .par_iter()
            .filter_map(|&f| self.best_split_for_feature(indices, f, g_sum, h_sum))
            .collect();
        let best = candidates.into_iter().fold(None::<SplitCandidate>, |best, c| match best {
            Some(b) if b.gain >= c.gain => Some(b),
            _ => Some(c),
        });

        match best {
            Some(split) if split.gain > self.config.gamma => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| self.x[[i, split.feature]] <= split.threshold);

                if left_idx.is_empty() || right_idx.is_empty() {
                    return TreeNode::Leaf { weight };
                }

                TreeNode::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(self.build(&left_idx, depth + 1)),
                    right: Box::new(self.build(&right_idx, depth + 1)),
                }
            }
            _ => TreeNode::Leaf { weight },
        }
    }

    /// Exact greedy scan over the sorted values of one feature
    fn best_split_for_feature(
        &self,
        indices: &[usize],
        feature: usize,
        g_total: f64,
        h_total: f64,
    ) -> Option<SplitCandidate> {
        let x = self.x;
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(Ordering::Equal)
        });

        let lambda = self.config.reg_lambda;
        let parent_score = g_total * g_total / (h_total + lambda);
        let mut g_left = 0.0;
        let mut h_left = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for pair in sorted.windows(2) {
            let (idx, next) = (pair[0], pair[1]);
            g_left += self.grad[idx];
            h_left += self.hess[idx];

            let (value, next_value) = (x[[idx, feature]], x[[next, feature]]);
            if (next_value - value).abs() < 1e-12 {
                continue;
            }

            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight {
                continue;
            }

            let gain = 0.5
                * (g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda) - parent_score);

            if best.map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (value + next_value) / 2.0,
                    gain,
                });
            }
        }

        best
    }
}

/// Gradient boosted tree regressor (squared error)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: BoosterConfig,
    trees: Vec<TreeNode>,
    base_score: f64,
    n_features: usize,
    is_fitted: bool,
}

impl GradientBoostingRegressor {
    pub fn new(config: BoosterConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_score: 0.0,
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &BoosterConfig {
        &self.config
    }

    /// Fit on `x` (rows = samples) against finite targets `y`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 {
            return Err(AutoPriceError::TrainingError("no training rows".to_string()));
        }
        if y.len() != n_samples {
            return Err(AutoPriceError::ShapeError {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(AutoPriceError::TrainingError("targets must be finite".to_string()));
        }

        self.n_features = n_features;
        self.base_score = y.mean().unwrap_or(0.0);
        self.trees.clear();

        let mut preds = Array1::from_elem(n_samples, self.base_score);
        let hess = Array1::from_elem(n_samples, 1.0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);

        for round in 0..self.config.n_estimators {
            let grad: Array1<f64> = &preds - y;

            let rows = subsample(&mut rng, n_samples, self.config.subsample);
            let cols = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let builder = TreeBuilder {
                x,
                grad: &grad,
                hess: &hess,
                features: &cols,
                config: &self.config,
            };
            let tree = builder.build(&rows, 0);

            // Every row moves, sampled or not
            for (i, row) in x.rows().into_iter().enumerate() {
                preds[i] += self.config.learning_rate * tree.predict(&row);
            }
            self.trees.push(tree);

            if (round + 1) % 250 == 0 {
                let mse = (&preds - y).mapv(|e| e * e).mean().unwrap_or(0.0);
                debug!(round = round + 1, train_rmse = mse.sqrt(), "Boosting progress");
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// One prediction per row of `x`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(AutoPriceError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(AutoPriceError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let lr = self.config.learning_rate;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.base_score + lr * self.trees.iter().map(|t| t.predict(&row)).sum::<f64>())
            .collect())
    }

    /// Share of splits using each feature
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if !self.is_fitted || self.n_features == 0 {
            return None;
        }
        let mut counts = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.count_splits(&mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter_mut().for_each(|c| *c /= total);
        }
        Some(Array1::from_vec(counts))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

/// Sorted sample of `ceil(n * ratio)` indices, all of them when `ratio >= 1`
fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil().max(1.0) as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k.min(n));
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((50, 2), (0..100).map(|i| i as f64 * 0.1).collect()).unwrap();
        let y: Array1<f64> = x.rows().into_iter().map(|r| r[0] * 2.0 + r[1] * 0.5 + 1.0).collect();
        (x, y)
    }

    fn small_config() -> BoosterConfig {
        BoosterConfig::default()
            .with_n_estimators(100)
            .with_learning_rate(0.1)
            .with_max_depth(4)
    }

    #[test]
    fn test_fits_linear_signal() {
        let (x, y) = regression_data();
        let mut model = GradientBoostingRegressor::new(small_config());
        model.fit(&x, &y).unwrap();

        let preds = model.predict(&x).unwrap();
        let metrics = crate::training::EvaluationMetrics::compute(&y, &preds).unwrap();
        assert!(metrics.r2 > 0.9, "R2 = {}", metrics.r2);
        assert_eq!(model.n_trees(), 100);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = regression_data();
        let mut a = GradientBoostingRegressor::new(small_config());
        let mut b = GradientBoostingRegressor::new(small_config());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_leaf_weight_regularized() {
        // A single-leaf tree on constant-gradient rows: w = -G / (H + lambda)
        let x = Array2::zeros((4, 1));
        let grad = Array1::from_elem(4, -2.0);
        let hess = Array1::from_elem(4, 1.0);
        let config = BoosterConfig::default();
        let builder = TreeBuilder { x: &x, grad: &grad, hess: &hess, features: &[0], config: &config };

        match builder.build(&[0, 1, 2, 3], 0) {
            TreeNode::Leaf { weight } => assert!((weight - 8.0 / 5.0).abs() < 1e-12),
            other => panic!("expected a leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let model = GradientBoostingRegressor::new(BoosterConfig::default());
        let x = Array2::zeros((1, 2));
        assert!(matches!(model.predict(&x), Err(AutoPriceError::ModelNotFitted)));
    }

    #[test]
    fn test_feature_count_checked() {
        let (x, y) = regression_data();
        let mut model = GradientBoostingRegressor::new(small_config().with_n_estimators(5));
        model.fit(&x, &y).unwrap();
        let wrong = Array2::zeros((3, 5));
        assert!(matches!(model.predict(&wrong), Err(AutoPriceError::ShapeError { .. })));
    }

    #[test]
    fn test_invalid_config() {
        let config = BoosterConfig::default().with_subsample(0.0);
        assert!(matches!(config.validate(), Err(AutoPriceError::ConfigError(_))));
    }

    #[test]
    fn test_subsample_size() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let idx = subsample(&mut rng, 10, 0.8);
        assert_eq!(idx.len(), 8);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(subsample(&mut rng, 3, 1.0), vec![0, 1, 2]);
    }
}
