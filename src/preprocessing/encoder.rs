//! Categorical one-hot encoding

use crate::error::{AutoPriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder with an ignore policy for unknown levels.
///
/// Levels are learned per column and kept sorted, so output positions only
/// depend on the vocabulary, never on row order. A level unseen at fit time
/// encodes as an all-zero segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    // column name -> sorted categories
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the vocabulary of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.categories.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| AutoPriceError::PreprocessingError(format!("column not found: {}", col_name)))?;
            let ca = column
                .str()
                .map_err(|e| AutoPriceError::DataError(e.to_string()))?;

            let levels: BTreeSet<&str> = ca.into_iter().flatten().collect();
            self.categories.push((
                col_name.to_string(),
                levels.into_iter().map(str::to_string).collect(),
            ));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// One-hot block of one fitted column: `n_rows x n_levels`, row-major
    pub fn transform_column(&self, df: &DataFrame, column: &str) -> Result<Vec<Vec<f64>>> {
        if !self.is_fitted {
            return Err(AutoPriceError::ModelNotFitted);
        }
        let levels = self
            .categories(column)
            .ok_or_else(|| AutoPriceError::PreprocessingError(format!("column not fitted: {}", column)))?;

        let ca = df
            .column(column)
            .map_err(|_| AutoPriceError::SchemaDrift { missing: vec![column.to_string()] })?
            .str()
            .map_err(|e| AutoPriceError::DataError(e.to_string()))?;

        Ok(ca
            .into_iter()
            .map(|value| {
                let mut row = vec![0.0; levels.len()];
                if let Some(pos) = value.and_then(|v| levels.binary_search_by(|l| l.as_str().cmp(v)).ok()) {
                    row[pos] = 1.0;
                }
                row
            })
            .collect())
    }

    /// Sorted levels learned for `column`
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, levels)| levels.as_slice())
    }

    /// Output width across all fitted columns
    pub fn n_output_features(&self) -> usize {
        self.categories.iter().map(|(_, levels)| levels.len()).sum()
    }

    /// `column=level` names in output order
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(name, levels)| levels.iter().map(move |l| format!("{}={}", name, l)))
            .collect()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuel_df(values: &[&str]) -> DataFrame {
        DataFrame::new(vec![Column::new("fuelType".into(), values)]).unwrap()
    }

    #[test]
    fn test_onehot_sorted_levels() {
        let df = fuel_df(&["Gas", "Electric", "Diesel", "Gas"]);
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &["fuelType"]).unwrap();

        assert_eq!(
            encoder.categories("fuelType").unwrap(),
            &["Diesel".to_string(), "Electric".to_string(), "Gas".to_string()]
        );
        assert_eq!(encoder.n_output_features(), 3);

        let block = encoder.transform_column(&df, "fuelType").unwrap();
        assert_eq!(block[0], vec![0.0, 0.0, 1.0]);
        assert_eq!(block[2], vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unseen_level_is_all_zero() {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&fuel_df(&["Gas", "Diesel"]), &["fuelType"]).unwrap();

        let block = encoder.transform_column(&fuel_df(&["Hydrogen"]), "fuelType").unwrap();
        assert_eq!(block, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_feature_names() {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&fuel_df(&["Gas", "Diesel"]), &["fuelType"]).unwrap();
        assert_eq!(encoder.feature_names(), vec!["fuelType=Diesel", "fuelType=Gas"]);
    }
}
