//! Composed encoding transform: standard-scaled numerics followed by one-hot categoricals

use super::encoder::OneHotEncoder;
use super::scaler::StandardScaler;
use crate::error::{AutoPriceError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fitted feature encoding shared by training and inference.
///
/// Output layout is `[numeric columns in fit order, then one one-hot segment
/// per categorical column in fit order]`. Once fit the transform is never
/// refit; inference loads it from the artifact store and applies it as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingTransform {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    n_samples_seen: usize,
}

impl EncodingTransform {
    /// Fit scaling and one-hot vocabularies on an imputed frame
    pub fn fit(df: &DataFrame, numeric_columns: &[&str], categorical_columns: &[&str]) -> Result<Self> {
        let mut scaler = StandardScaler::new();
        scaler.fit(df, numeric_columns)?;

        let mut encoder = OneHotEncoder::new();
        encoder.fit(df, categorical_columns)?;

        Ok(Self {
            numeric_columns: numeric_columns.iter().map(|s| s.to_string()).collect(),
            categorical_columns: categorical_columns.iter().map(|s| s.to_string()).collect(),
            scaler,
            encoder,
            n_samples_seen: df.height(),
        })
    }

    /// Encode `df` into a dense matrix, one row per frame row.
    ///
    /// Every fitted column must be present; extra columns are ignored.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let missing = self.missing_columns(df);
        if !missing.is_empty() {
            return Err(AutoPriceError::SchemaDrift { missing });
        }

        let n_rows = df.height();
        let n_cols = self.n_output_features();
        let mut matrix = Array2::<f64>::zeros((n_rows, n_cols));
        let mut offset = 0;

        for column in &self.numeric_columns {
            let values = self.scaler.transform_column(df, column)?;
            for (i, v) in values.into_iter().enumerate() {
                matrix[[i, offset]] = v;
            }
            offset += 1;
        }

        for column in &self.categorical_columns {
            let block = self.encoder.transform_column(df, column)?;
            let width = self.encoder.categories(column).map_or(0, <[String]>::len);
            for (i, row) in block.into_iter().enumerate() {
                for (j, v) in row.into_iter().enumerate() {
                    matrix[[i, offset + j]] = v;
                }
            }
            offset += width;
        }

        if offset != n_cols {
            return Err(AutoPriceError::ShapeError {
                expected: format!("{} encoded columns", n_cols),
                actual: format!("{} encoded columns", offset),
            });
        }

        Ok(matrix)
    }

    /// Fitted columns absent from `df`
    pub fn missing_columns(&self, df: &DataFrame) -> Vec<String> {
        self.required_columns()
            .filter(|c| df.column(c).is_err())
            .map(str::to_string)
            .collect()
    }

    /// Every input column the transform reads, numeric first
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric_columns
            .iter()
            .chain(self.categorical_columns.iter())
            .map(String::as_str)
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Number of numeric columns plus the sum of one-hot levels
    pub fn n_output_features(&self) -> usize {
        self.numeric_columns.len() + self.encoder.n_output_features()
    }

    /// Output column names in matrix order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        names.extend(self.encoder.feature_names());
        names
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }
}
