//! End-to-end run: retrain, predict, write back

mod config;

pub use config::PipelineConfig;

use crate::artifacts::ArtifactStore;
use crate::data::ListingRecord;
use crate::error::{AutoPriceError, Result};
use crate::inference::{write_back, PredictionSink, Predictor, WriteBackReport};
use crate::training::{EvaluationMetrics, Trainer};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Summary of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Records with a price, used for training
    pub trained_on: usize,
    pub metrics: EvaluationMetrics,
    pub predicted: usize,
    pub write_back: WriteBackReport,
}

/// Retrain on the priced records of `records`, then price every record and
/// write the results to `sink`.
///
/// Each stage overwrites the artifacts of the previous run; the caller must
/// not run two pipelines against the same store at once.
pub fn run_pipeline(
    records: &[ListingRecord],
    config: &PipelineConfig,
    store: &dyn ArtifactStore,
    sink: &mut dyn PredictionSink,
) -> Result<PipelineReport> {
    let start = Instant::now();
    if records.is_empty() {
        return Err(AutoPriceError::DataError("no records to process".to_string()));
    }

    let labelled: Vec<ListingRecord> = records
        .iter()
        .filter(|r| r.price.is_some_and(f64::is_finite))
        .cloned()
        .collect();
    info!(
        records = records.len(),
        labelled = labelled.len(),
        "Starting pipeline run"
    );

    let trainer = Trainer::new(config.trainer.clone(), config.preprocessing.clone(), store);
    let trained = trainer.train(&labelled)?;

    let predictor = Predictor::new(config.preprocessing.clone(), store);
    let predictions = predictor.predict(records)?;

    let written = write_back(&predictions, sink)?;

    let report = PipelineReport {
        trained_on: labelled.len(),
        metrics: trained.metrics,
        predicted: predictions.len(),
        write_back: written,
    };
    info!(
        predicted = report.predicted,
        written = report.write_back.written,
        skipped = report.write_back.skipped,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Pipeline run completed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::InMemoryArtifactStore;
    use crate::inference::Prediction;
    use crate::training::{BoosterConfig, TrainerConfig};

    #[test]
    fn test_empty_batch() {
        let store = InMemoryArtifactStore::new();
        let mut sink: Vec<Prediction> = Vec::new();
        let err = run_pipeline(&[], &PipelineConfig::default(), &store, &mut sink).unwrap_err();
        assert!(matches!(err, AutoPriceError::DataError(_)));
    }

    #[test]
    fn test_unpriced_records_are_still_predicted() {
        let mut records: Vec<ListingRecord> = (0..12)
            .map(|i| {
                ListingRecord::new(format!("V{}", i))
                    .with_title("2017 Nissan Altima")
                    .with_mileage(30_000.0 + 2_000.0 * i as f64)
                    .with_price(16_000.0 - 100.0 * i as f64)
            })
            .collect();
        records.push(ListingRecord::new("NEW").with_title("2017 Nissan Altima").with_mileage(31_000.0));

        let config = PipelineConfig::default()
            .with_trainer(TrainerConfig::default().with_booster(BoosterConfig::default().with_n_estimators(20)));
        let store = InMemoryArtifactStore::new();
        let mut sink: Vec<Prediction> = Vec::new();

        let report = run_pipeline(&records, &config, &store, &mut sink).unwrap();
        assert_eq!(report.trained_on, 12);
        assert_eq!(report.predicted, 13);
        assert_eq!(report.write_back.written, 13);
        assert_eq!(sink.last().and_then(|p| p.vin.as_deref()), Some("NEW"));
    }
}
