//! Feature preprocessing pipeline: records in, encoded matrix out

use super::{
    config::PreprocessingConfig,
    imputer::{ImputeStrategy, Imputer},
    title::{parse_title, ParsedTitle},
    transform::EncodingTransform,
    PreprocessMode, CATEGORICAL_FEATURES, NUMERICAL_FEATURES,
};
use crate::artifacts::{load_artifact, save_artifact, ArtifactStore, TRANSFORM_KEY};
use crate::data::ListingRecord;
use crate::error::{AutoPriceError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Imputed, not yet encoded features for one batch
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    /// Feature columns present in the batch, row-aligned with the records
    pub frame: DataFrame,
    /// `price` per row (NaN where a record has none); `None` if no record has a price
    pub target: Option<Array1<f64>>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
}

/// Result of [`FeaturePreprocessor::preprocess`]
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub matrix: Array2<f64>,
    pub target: Option<Array1<f64>>,
    pub transform: EncodingTransform,
}

/// Turns listing records into the model's feature matrix.
///
/// Training fits the [`EncodingTransform`] and stores it; inference loads the
/// stored one and never refits. Column selection and imputation are the same
/// in both modes apart from the numeric fill values.
#[derive(Debug, Clone, Default)]
pub struct FeaturePreprocessor {
    config: PreprocessingConfig,
}

impl FeaturePreprocessor {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Build, impute and encode a batch of records.
    ///
    /// Training fits a fresh transform and stores it; inference encodes with
    /// the stored one. See [`FeaturePreprocessor::fit`] to fit without storing.
    pub fn preprocess(
        &self,
        records: &[ListingRecord],
        mode: PreprocessMode,
        store: &dyn ArtifactStore,
    ) -> Result<PreprocessOutput> {
        match mode {
            PreprocessMode::Training => {
                let output = self.fit(records)?;
                save_artifact(store, TRANSFORM_KEY, &output.transform)?;
                debug!(features = output.transform.n_output_features(), "Stored fitted encoding transform");
                Ok(output)
            }
            PreprocessMode::Inference => {
                let transform = load_artifact::<EncodingTransform>(store, TRANSFORM_KEY)?;
                self.apply(records, transform)
            }
        }
    }

    /// Fit a transform on `records` and encode them with it. Nothing is persisted.
    pub fn fit(&self, records: &[ListingRecord]) -> Result<PreprocessOutput> {
        let start = Instant::now();
        let features = self.assemble(records, PreprocessMode::Training, &[])?;

        let numeric: Vec<&str> = features.numeric_columns.iter().map(String::as_str).collect();
        let categorical: Vec<&str> = features.categorical_columns.iter().map(String::as_str).collect();
        let transform = EncodingTransform::fit(&features.frame, &numeric, &categorical)?;
        let matrix = transform.transform(&features.frame)?;

        Self::log_batch(PreprocessMode::Training, &matrix, start);
        Ok(PreprocessOutput {
            matrix,
            target: features.target,
            transform,
        })
    }

    /// Encode `records` with an already fitted transform.
    ///
    /// A fitted column that no record supplies is rebuilt from the
    /// inference fill values, so a single listing without mileage still
    /// encodes to the fitted width.
    pub fn apply(&self, records: &[ListingRecord], transform: EncodingTransform) -> Result<PreprocessOutput> {
        let start = Instant::now();
        let required: Vec<&str> = transform.required_columns().collect();
        let features = self.assemble(records, PreprocessMode::Inference, &required)?;

        let extra: Vec<&str> = features
            .numeric_columns
            .iter()
            .chain(features.categorical_columns.iter())
            .map(String::as_str)
            .filter(|c| !required.contains(c))
            .collect();
        if !extra.is_empty() {
            debug!(?extra, "Columns unknown to the fitted transform are ignored");
        }

        let matrix = transform.transform(&features.frame)?;

        Self::log_batch(PreprocessMode::Inference, &matrix, start);
        Ok(PreprocessOutput {
            matrix,
            target: features.target,
            transform,
        })
    }

    /// Parse titles, resolve fields, select present columns and impute.
    ///
    /// A feature column no record supplies is dropped rather than imputed.
    /// `year`, `make` and `model` count as supplied whenever any record has
    /// a title to derive them from.
    pub fn build_features(&self, records: &[ListingRecord], mode: PreprocessMode) -> Result<FeatureFrame> {
        self.assemble(records, mode, &[])
    }

    /// [`Self::build_features`], additionally keeping every column in `required`
    /// even when the batch never supplies it
    fn assemble(&self, records: &[ListingRecord], mode: PreprocessMode, required: &[&str]) -> Result<FeatureFrame> {
        if records.is_empty() {
            return Err(AutoPriceError::DataError("empty record batch".to_string()));
        }

        let parsed: Vec<ParsedTitle> = records
            .iter()
            .map(|r| parse_title(r.title.as_deref()))
            .collect();

        let any_title = records.iter().any(|r| r.title.is_some());
        let mut columns: Vec<Column> = Vec::with_capacity(NUMERICAL_FEATURES.len() + CATEGORICAL_FEATURES.len());
        let mut numeric_columns = Vec::new();
        let mut categorical_columns = Vec::new();
        let mut dropped = Vec::new();
        let mut backfilled = Vec::new();

        for &name in NUMERICAL_FEATURES.iter() {
            let values: Vec<Option<f64>> = records
                .iter()
                .zip(&parsed)
                .map(|(r, p)| match name {
                    "year" => r.year.or(p.year.map(f64::from)),
                    _ => r.mileage,
                })
                .collect();
            let supplied = (name == "year" && any_title) || values.iter().any(Option::is_some);
            if supplied || required.contains(&name) {
                if !supplied {
                    backfilled.push(name);
                }
                columns.push(Column::new(name.into(), values));
                numeric_columns.push(name.to_string());
            } else {
                dropped.push(name);
            }
        }

        for &name in CATEGORICAL_FEATURES.iter() {
            let values: Vec<Option<String>> = records
                .iter()
                .zip(&parsed)
                .map(|(r, p)| match name {
                    "make" => r.make.clone().or_else(|| p.make.clone()),
                    "model" => r.model.clone().or_else(|| p.model.clone()),
                    "fuelType" => r.fuel_type.clone(),
                    _ => r.transmission.clone(),
                })
                .collect();
            let supplied = (matches!(name, "make" | "model") && any_title) || values.iter().any(Option::is_some);
            if supplied || required.contains(&name) {
                if !supplied {
                    backfilled.push(name);
                }
                columns.push(Column::new(name.into(), values));
                categorical_columns.push(name.to_string());
            } else {
                dropped.push(name);
            }
        }

        if columns.is_empty() {
            return Err(AutoPriceError::DataError(
                "no feature columns present in batch".to_string(),
            ));
        }
        if !dropped.is_empty() {
            debug!(?dropped, "Feature columns absent from batch");
        }
        if !backfilled.is_empty() {
            debug!(?backfilled, "Fitted columns absent from batch, filled with defaults");
        }

        let target = records
            .iter()
            .any(|r| r.price.is_some())
            .then(|| records.iter().map(|r| r.price.unwrap_or(f64::NAN)).collect::<Array1<f64>>());

        let frame = DataFrame::new(columns)?;
        let frame = Self::cast_categoricals_to_text(&frame, &categorical_columns)?;
        let frame = self.impute(&frame, &numeric_columns, &categorical_columns, mode)?;

        Ok(FeatureFrame {
            frame,
            target,
            numeric_columns,
            categorical_columns,
        })
    }

    fn log_batch(mode: PreprocessMode, matrix: &Array2<f64>, start: Instant) {
        info!(
            mode = ?mode,
            rows = matrix.nrows(),
            encoded_features = matrix.ncols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessed batch"
        );
    }

    fn numeric_strategy(&self, column: &str, mode: PreprocessMode) -> ImputeStrategy {
        let constant = match column {
            "year" => self.config.inference_year_fill,
            _ => self.config.inference_mileage_fill,
        };
        match mode {
            PreprocessMode::Training => ImputeStrategy::Median { fallback: constant },
            PreprocessMode::Inference => ImputeStrategy::Constant(constant),
        }
    }

    fn impute(
        &self,
        df: &DataFrame,
        numeric_columns: &[String],
        categorical_columns: &[String],
        mode: PreprocessMode,
    ) -> Result<DataFrame> {
        let mut result = df.clone();

        for column in numeric_columns {
            let mut imputer = Imputer::new(self.numeric_strategy(column, mode));
            result = imputer.fit_transform(&result, &[column.as_str()])?;
            debug!(column = %column, fill = ?imputer.numeric_fill(column), "Imputed numeric column");
        }

        if !categorical_columns.is_empty() {
            let cols: Vec<&str> = categorical_columns.iter().map(String::as_str).collect();
            let mut imputer = Imputer::new(ImputeStrategy::ConstantString(self.config.unknown_label.clone()));
            result = imputer.fit_transform(&result, &cols)?;
        }

        Ok(result)
    }

    /// Force categorical columns to string dtype so numeric-looking codes stay categorical
    fn cast_categoricals_to_text(df: &DataFrame, categorical_columns: &[String]) -> Result<DataFrame> {
        let mut result = df.clone();
        for name in categorical_columns {
            let column = df.column(name)?;
            if column.dtype() != &DataType::String {
                let casted = column.cast(&DataType::String)?;
                result.with_column(casted)?;
            }
        }
        Ok(result)
    }
}
