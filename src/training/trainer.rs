//! Training run: preprocess, split, fit, evaluate, persist

use super::config::TrainerConfig;
use super::gradient_boosting::GradientBoostingRegressor;
use super::metrics::EvaluationMetrics;
use super::split::TrainTestSplit;
use crate::artifacts::{
    save_artifact, save_json, ArtifactStore, MetricsHistory, METRICS_KEY, MODEL_KEY, TRANSFORM_KEY,
};
use crate::data::ListingRecord;
use crate::error::{AutoPriceError, Result};
use crate::preprocessing::{EncodingTransform, FeaturePreprocessor, PreprocessingConfig};
use std::time::Instant;
use tracing::{debug, info};

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub model: GradientBoostingRegressor,
    pub metrics: EvaluationMetrics,
    pub transform: EncodingTransform,
}

/// Fits the price model on labelled records and stores the artifacts
pub struct Trainer<'a> {
    config: TrainerConfig,
    preprocessor: FeaturePreprocessor,
    store: &'a dyn ArtifactStore,
}

impl<'a> Trainer<'a> {
    pub fn new(config: TrainerConfig, preprocessing: PreprocessingConfig, store: &'a dyn ArtifactStore) -> Self {
        Self {
            config,
            preprocessor: FeaturePreprocessor::new(preprocessing),
            store,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on `records`, overwriting the stored transform, model and metrics.
    ///
    /// Every record must carry a price; labels are never imputed. The
    /// transform and model are written together only once the model has
    /// fit, so a failed run leaves the previous pair in place.
    pub fn train(&self, records: &[ListingRecord]) -> Result<TrainOutput> {
        let start = Instant::now();
        self.config.validate()?;
        Self::check_labels(records)?;
        let split = TrainTestSplit::new(records.len(), self.config.test_size, self.config.random_state)?;

        let prepared = self.preprocessor.fit(records)?;
        let target = prepared
            .target
            .ok_or_else(|| AutoPriceError::DataError("training batch has no price column".to_string()))?;

        let (x_train, x_test, y_train, y_test) = split.apply(&prepared.matrix, &target);
        info!(
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            features = x_train.ncols(),
            "Training price model"
        );

        let mut model = GradientBoostingRegressor::new(self.config.booster.clone());
        model.fit(&x_train, &y_train)?;

        let y_pred = model.predict(&x_test)?;
        let metrics = EvaluationMetrics::compute(&y_test, &y_pred)?;

        if let Some(importances) = model.feature_importances() {
            let mut ranked: Vec<(String, f64)> = prepared
                .transform
                .feature_names()
                .into_iter()
                .zip(importances.iter().copied())
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            ranked.truncate(5);
            debug!(?ranked, "Top features by split share");
        }

        save_artifact(self.store, TRANSFORM_KEY, &prepared.transform)?;
        save_artifact(self.store, MODEL_KEY, &model)?;
        save_json(self.store, METRICS_KEY, &metrics)?;
        MetricsHistory::append(self.store, &metrics)?;

        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model trained and saved"
        );

        Ok(TrainOutput {
            model,
            metrics,
            transform: prepared.transform,
        })
    }

    fn check_labels(records: &[ListingRecord]) -> Result<()> {
        if records.is_empty() {
            return Err(AutoPriceError::DataError("empty training batch".to_string()));
        }
        let unlabelled = records
            .iter()
            .filter(|r| !r.price.is_some_and(f64::is_finite))
            .count();
        if unlabelled == records.len() {
            return Err(AutoPriceError::DataError(
                "no record carries a price; cannot train".to_string(),
            ));
        }
        if unlabelled > 0 {
            return Err(AutoPriceError::DataError(format!(
                "{} of {} records lack a price",
                unlabelled,
                records.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::InMemoryArtifactStore;
    use crate::training::BoosterConfig;

    fn quick_config() -> TrainerConfig {
        TrainerConfig::default().with_booster(BoosterConfig::default().with_n_estimators(20))
    }

    fn labelled(n: usize) -> Vec<ListingRecord> {
        (0..n)
            .map(|i| {
                ListingRecord::new(format!("VIN{}", i))
                    .with_title(if i % 2 == 0 { "2019 Toyota Corolla" } else { "2016 Honda Fit" })
                    .with_mileage(20_000.0 + 1_000.0 * i as f64)
                    .with_price(20_000.0 - 50.0 * i as f64)
            })
            .collect()
    }

    #[test]
    fn test_train_persists_artifacts() {
        let store = InMemoryArtifactStore::new();
        let trainer = Trainer::new(quick_config(), PreprocessingConfig::default(), &store);
        let output = trainer.train(&labelled(20)).unwrap();

        assert!(output.model.is_fitted());
        for key in [TRANSFORM_KEY, MODEL_KEY, METRICS_KEY] {
            assert!(store.exists(key).unwrap(), "missing {}", key);
        }
        assert_eq!(MetricsHistory::load(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_unlabelled_batch() {
        let store = InMemoryArtifactStore::new();
        let records: Vec<ListingRecord> = labelled(5)
            .into_iter()
            .map(|mut r| {
                r.price = None;
                r
            })
            .collect();

        let err = Trainer::new(quick_config(), PreprocessingConfig::default(), &store)
            .train(&records)
            .unwrap_err();
        assert!(matches!(err, AutoPriceError::DataError(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_run_keeps_previous_artifacts() {
        let store = InMemoryArtifactStore::new();
        let trainer = Trainer::new(quick_config(), PreprocessingConfig::default(), &store);
        trainer.train(&labelled(20)).unwrap();
        let transform = store.get(TRANSFORM_KEY).unwrap();
        let model = store.get(MODEL_KEY).unwrap();

        let lone = vec![ListingRecord::new("ONE")
            .with_title("2021 Mazda CX-5")
            .with_mileage(5_000.0)
            .with_fuel_type("Gas")
            .with_price(27_000.0)];
        let err = trainer.train(&lone).unwrap_err();
        assert!(matches!(err, AutoPriceError::DataError(_)));

        assert_eq!(store.get(TRANSFORM_KEY).unwrap(), transform);
        assert_eq!(store.get(MODEL_KEY).unwrap(), model);
        assert_eq!(MetricsHistory::load(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_partially_labelled_batch() {
        let store = InMemoryArtifactStore::new();
        let mut records = labelled(5);
        records[2].price = None;

        let err = Trainer::new(quick_config(), PreprocessingConfig::default(), &store)
            .train(&records)
            .unwrap_err();
        assert!(matches!(err, AutoPriceError::DataError(_)));
    }
}
