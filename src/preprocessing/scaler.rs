//! Feature scaling

use crate::error::{AutoPriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fitted centre/scale for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64,
    pub scale: f64,
}

/// Standard (z-score) scaler: `(x - mean) / std`.
///
/// Uses the population standard deviation. A constant column gets scale 1
/// so it maps to zeros instead of NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit per-column mean and std; column order is kept for [`Self::transform_column`]
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| AutoPriceError::PreprocessingError(format!("column not found: {}", col_name)))?;
            let params = Self::compute_params(column.as_materialized_series())?;
            self.params.push((col_name.to_string(), params));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scaled values of one fitted column, row-aligned with `df`
    pub fn transform_column(&self, df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        if !self.is_fitted {
            return Err(AutoPriceError::ModelNotFitted);
        }
        let params = self
            .params(column)
            .ok_or_else(|| AutoPriceError::PreprocessingError(format!("column not fitted: {}", column)))?;

        let ca = df
            .column(column)
            .map_err(|_| AutoPriceError::SchemaDrift { missing: vec![column.to_string()] })?
            .f64()
            .map_err(|e| AutoPriceError::DataError(e.to_string()))?;

        ca.into_iter()
            .map(|opt| {
                opt.map(|v| (v - params.center) / params.scale).ok_or_else(|| {
                    AutoPriceError::DataError(format!("unimputed null in numeric column {}", column))
                })
            })
            .collect()
    }

    /// Fitted parameters for `column`
    pub fn params(&self, column: &str) -> Option<&ScalerParams> {
        self.params
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, p)| p)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn compute_params(series: &Series) -> Result<ScalerParams> {
        let ca = series
            .f64()
            .map_err(|e| AutoPriceError::DataError(e.to_string()))?;

        let values: Vec<f64> = ca.into_iter().flatten().collect();
        if values.is_empty() {
            return Ok(ScalerParams { center: 0.0, scale: 1.0 });
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();

        Ok(ScalerParams {
            center: mean,
            scale: if std < 1e-12 { 1.0 } else { std },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let df = DataFrame::new(vec![
            Column::new("mileage".into(), &[10_000.0, 20_000.0, 30_000.0, 40_000.0]),
        ])
        .unwrap();

        let mut scaler = StandardScaler::new();
        scaler.fit(&df, &["mileage"]).unwrap();
        let scaled = scaler.transform_column(&df, "mileage").unwrap();

        let mean: f64 = scaled.iter().sum::<f64>() / scaled.len() as f64;
        let var: f64 = scaled.iter().map(|v| v * v).sum::<f64>() / scaled.len() as f64;
        assert!(mean.abs() < 1e-10);
        assert!((var - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let df = DataFrame::new(vec![Column::new("year".into(), &[2020.0, 2020.0, 2020.0])]).unwrap();

        let mut scaler = StandardScaler::new();
        scaler.fit(&df, &["year"]).unwrap();

        assert_eq!(scaler.params("year").unwrap().scale, 1.0);
        assert_eq!(scaler.transform_column(&df, "year").unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_schema_drift() {
        let train = DataFrame::new(vec![Column::new("year".into(), &[2019.0, 2021.0])]).unwrap();
        let other = DataFrame::new(vec![Column::new("mileage".into(), &[1.0, 2.0])]).unwrap();

        let mut scaler = StandardScaler::new();
        scaler.fit(&train, &["year"]).unwrap();
        let err = scaler.transform_column(&other, "year").unwrap_err();
        assert!(matches!(err, AutoPriceError::SchemaDrift { .. }));
    }
}
