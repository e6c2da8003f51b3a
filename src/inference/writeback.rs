//! Writing predicted prices back to the inventory

use super::predictor::Prediction;
use crate::error::{AutoPriceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Destination for predicted prices, keyed by vin
pub trait PredictionSink {
    /// Persist `predictions` (all carry a vin); returns how many were written
    fn write(&mut self, predictions: &[Prediction]) -> Result<usize>;
}

/// Collects predictions in memory
impl PredictionSink for Vec<Prediction> {
    fn write(&mut self, predictions: &[Prediction]) -> Result<usize> {
        self.extend_from_slice(predictions);
        Ok(predictions.len())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceRow {
    vin: String,
    predicted_price: f64,
}

/// JSON file of `[{"vin": .., "predicted_price": ..}]`.
///
/// Writing upserts by vin: rows already in the file for other vins are kept,
/// rows for the same vin are replaced.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing(&self) -> Result<BTreeMap<String, f64>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let rows: Vec<PriceRow> = serde_json::from_str(&content)?;
        Ok(rows.into_iter().map(|r| (r.vin, r.predicted_price)).collect())
    }
}

impl PredictionSink for JsonFileSink {
    fn write(&mut self, predictions: &[Prediction]) -> Result<usize> {
        let mut prices = self.read_existing()?;
        let mut written = 0;
        for prediction in predictions {
            let vin = prediction.vin.as_ref().ok_or_else(|| {
                AutoPriceError::DataError("prediction without vin reached the sink".to_string())
            })?;
            prices.insert(vin.clone(), prediction.predicted_price);
            written += 1;
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let rows: Vec<PriceRow> = prices
            .into_iter()
            .map(|(vin, predicted_price)| PriceRow { vin, predicted_price })
            .collect();
        fs::write(&self.path, serde_json::to_string_pretty(&rows)?)?;

        Ok(written)
    }
}

/// Outcome of [`write_back`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBackReport {
    pub written: usize,
    pub skipped: usize,
}

/// Send predictions to `sink`, skipping any without a vin.
///
/// A prediction with no vin cannot be matched to an inventory row; it is
/// logged as a data error and counted, and the rest are still written.
pub fn write_back(predictions: &[Prediction], sink: &mut dyn PredictionSink) -> Result<WriteBackReport> {
    let mut keyed = Vec::with_capacity(predictions.len());
    let mut skipped = 0;

    for (row, prediction) in predictions.iter().enumerate() {
        match prediction.vin.as_deref() {
            Some(vin) if !vin.is_empty() => keyed.push(prediction.clone()),
            _ => {
                skipped += 1;
                let err = AutoPriceError::DataError(format!("prediction at row {} has no vin", row));
                warn!(error = %err, predicted_price = prediction.predicted_price, "Skipping write-back");
            }
        }
    }

    let written = if keyed.is_empty() { 0 } else { sink.write(&keyed)? };

    let report = WriteBackReport { written, skipped };
    info!(written = report.written, skipped = report.skipped, "Wrote back predictions");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(vin: Option<&str>, price: f64) -> Prediction {
        Prediction {
            vin: vin.map(str::to_string),
            predicted_price: price,
        }
    }

    #[test]
    fn test_skips_missing_vin() {
        let predictions = vec![
            prediction(Some("A"), 1.0),
            prediction(None, 2.0),
            prediction(Some(""), 3.0),
            prediction(Some("B"), 4.0),
        ];
        let mut sink: Vec<Prediction> = Vec::new();
        let report = write_back(&predictions, &mut sink).unwrap();

        assert_eq!(report, WriteBackReport { written: 2, skipped: 2 });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].vin.as_deref(), Some("B"));
    }

    #[test]
    fn test_json_sink_upserts_by_vin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("predictions.json");
        let mut sink = JsonFileSink::new(&path);

        write_back(&[prediction(Some("A"), 1.0), prediction(Some("B"), 2.0)], &mut sink).unwrap();
        write_back(&[prediction(Some("B"), 5.0)], &mut sink).unwrap();

        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["vin"], "A");
        assert_eq!(rows[1]["predicted_price"], 5.0);
    }
}
