//! Missing value imputation

use crate::error::{AutoPriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with the batch median; `fallback` when the column has no values at all
    Median { fallback: f64 },
    /// Replace with a constant number
    Constant(f64),
    /// Replace with a constant string (categorical)
    ConstantString(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values in a set of columns
#[derive(Debug, Clone)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: Vec<(String, ImputeValue)>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: Vec::new(),
            is_fitted: false,
        }
    }

    /// Compute fill values for `columns`
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| AutoPriceError::PreprocessingError(format!("column not found: {}", col_name)))?;

            let fill_value = self.compute_fill_value(column.as_materialized_series())?;
            self.fill_values.push((col_name.to_string(), fill_value));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace nulls in every fitted column; rows are never dropped or reordered
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(AutoPriceError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            if let Ok(column) = df.column(col_name) {
                let filled = Self::fill_series(column.as_materialized_series(), fill_value)?;
                result.with_column(filled)?;
            }
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Numeric fill value chosen for `column`, if it was fitted with one
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        self.fill_values.iter().find_map(|(name, value)| match value {
            ImputeValue::Numeric(v) if name == column => Some(*v),
            _ => None,
        })
    }

    fn compute_fill_value(&self, series: &Series) -> Result<ImputeValue> {
        match &self.strategy {
            ImputeStrategy::Median { fallback } => {
                let median = series
                    .f64()
                    .map_err(|e| AutoPriceError::DataError(e.to_string()))?
                    .median()
                    .unwrap_or(*fallback);
                Ok(ImputeValue::Numeric(median))
            }
            ImputeStrategy::Constant(val) => Ok(ImputeValue::Numeric(*val)),
            ImputeStrategy::ConstantString(val) => Ok(ImputeValue::String(val.clone())),
        }
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(fill) => {
                let ca = series
                    .f64()
                    .map_err(|e| AutoPriceError::DataError(e.to_string()))?;
                let filled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*fill)))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(fill) => {
                let ca = series
                    .str()
                    .map_err(|e| AutoPriceError::DataError(e.to_string()))?;
                let filled: StringChunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(fill.as_str())))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}
