//! Shuffled train/test splitting

use crate::error::{AutoPriceError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of one train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    /// Shuffle `0..n_samples` with `seed` and hold out `ceil(n * test_size)` rows.
    ///
    /// Both sides keep at least one row when `n_samples >= 2`.
    pub fn new(n_samples: usize, test_size: f64, seed: u64) -> Result<Self> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(AutoPriceError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        if n_samples < 2 {
            return Err(AutoPriceError::DataError(format!(
                "need at least 2 labelled rows to split, got {}",
                n_samples
            )));
        }

        let n_test = ((n_samples as f64) * test_size).ceil() as usize;
        let n_test = n_test.clamp(1, n_samples - 1);

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train_indices = indices.split_off(n_test);
        Ok(Self {
            train_indices,
            test_indices: indices,
        })
    }

    /// `(x_train, x_test, y_train, y_test)`
    pub fn apply(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>) {
        (
            x.select(Axis(0), &self.train_indices),
            x.select(Axis(0), &self.test_indices),
            y.select(Axis(0), &self.train_indices),
            y.select(Axis(0), &self.test_indices),
        )
    }
}
