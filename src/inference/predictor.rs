//! Batch price prediction from stored artifacts

use crate::artifacts::{load_artifact, ArtifactStore, MODEL_KEY};
use crate::data::ListingRecord;
use crate::error::{AutoPriceError, Result};
use crate::preprocessing::{FeaturePreprocessor, PreprocessMode, PreprocessingConfig};
use crate::training::GradientBoostingRegressor;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Predicted price for one listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub vin: Option<String>,
    pub predicted_price: f64,
}

/// Applies the stored transform and model to unlabelled records.
///
/// Never refits anything; a missing artifact is an error, not a retrain.
pub struct Predictor<'a> {
    preprocessor: FeaturePreprocessor,
    store: &'a dyn ArtifactStore,
}

impl<'a> Predictor<'a> {
    pub fn new(preprocessing: PreprocessingConfig, store: &'a dyn ArtifactStore) -> Self {
        Self {
            preprocessor: FeaturePreprocessor::new(preprocessing),
            store,
        }
    }

    /// One prediction per record, in input order
    pub fn predict(&self, records: &[ListingRecord]) -> Result<Vec<Prediction>> {
        let start = Instant::now();

        let prepared = self.preprocessor.preprocess(records, PreprocessMode::Inference, self.store)?;
        let model: GradientBoostingRegressor = load_artifact(self.store, MODEL_KEY)?;
        let prices = model.predict(&prepared.matrix)?;

        if prices.len() != records.len() {
            return Err(AutoPriceError::ShapeError {
                expected: format!("{} predictions", records.len()),
                actual: format!("{} predictions", prices.len()),
            });
        }

        let predictions: Vec<Prediction> = records
            .iter()
            .zip(prices.iter())
            .map(|(record, &price)| Prediction {
                vin: record.vin.clone(),
                predicted_price: price,
            })
            .collect();

        info!(
            rows = predictions.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Predicted prices"
        );
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{save_artifact, InMemoryArtifactStore};
    use crate::training::{BoosterConfig, Trainer, TrainerConfig};

    #[test]
    fn test_predict_without_training() {
        let store = InMemoryArtifactStore::new();
        let records = vec![ListingRecord::new("A").with_title("2019 Mazda 3")];
        let err = Predictor::new(PreprocessingConfig::default(), &store)
            .predict(&records)
            .unwrap_err();
        assert!(matches!(err, AutoPriceError::ArtifactMissing(_)));
    }

    #[test]
    fn test_predict_without_model() {
        let store = InMemoryArtifactStore::new();
        let records = vec![
            ListingRecord::new("A").with_title("2019 Mazda 3").with_price(15_000.0),
            ListingRecord::new("B").with_title("2017 Mazda 6").with_price(13_000.0),
        ];
        FeaturePreprocessor::default()
            .preprocess(&records, PreprocessMode::Training, &store)
            .unwrap();

        let err = Predictor::new(PreprocessingConfig::default(), &store)
            .predict(&records)
            .unwrap_err();
        assert!(matches!(err, AutoPriceError::ArtifactMissing(ref k) if k == MODEL_KEY));
    }

    #[test]
    fn test_predictions_follow_input_order() {
        let store = InMemoryArtifactStore::new();
        let train: Vec<ListingRecord> = (0..10)
            .map(|i| {
                ListingRecord::new(format!("T{}", i))
                    .with_title("2018 Subaru Outback")
                    .with_mileage(10_000.0 * i as f64)
                    .with_price(25_000.0 - 1_000.0 * i as f64)
            })
            .collect();
        let config = TrainerConfig::default().with_booster(BoosterConfig::default().with_n_estimators(10));
        let output = Trainer::new(config, PreprocessingConfig::default(), &store).train(&train).unwrap();
        save_artifact(&store, MODEL_KEY, &output.model).unwrap();

        let batch = vec![
            ListingRecord::new("Z").with_title("2018 Subaru Outback").with_mileage(5_000.0),
            ListingRecord::new("Y").with_title("2018 Subaru Outback").with_mileage(95_000.0),
        ];
        let predictions = Predictor::new(PreprocessingConfig::default(), &store).predict(&batch).unwrap();

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].vin.as_deref(), Some("Z"));
        assert_eq!(predictions[1].vin.as_deref(), Some("Y"));
        assert!(predictions.iter().all(|p| p.predicted_price.is_finite()));
    }
}
