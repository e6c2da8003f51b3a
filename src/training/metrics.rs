//! Regression evaluation metrics

use crate::error::{AutoPriceError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Held-out evaluation of a trained model.
///
/// Serialized as `{"MAE": .., "RMSE": .., "R2": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
}

impl EvaluationMetrics {
    /// Compute MAE, RMSE and R² of `y_pred` against `y_true`.
    ///
    /// R² is 0 when the true values have no variance.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(AutoPriceError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(AutoPriceError::ValidationError(
                "cannot evaluate on an empty split".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors: Array1<f64> = y_true - y_pred;

        let mse = errors.mapv(|e| e * e).sum() / n;
        let mae = errors.mapv(f64::abs).sum() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Ok(Self {
            mae,
            rmse: mse.sqrt(),
            r2,
        })
    }
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MAE={:.2} RMSE={:.2} R2={:.4}", self.mae, self.rmse, self.r2)
    }
}
