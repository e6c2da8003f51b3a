//! Append-only history of evaluation metrics

use super::{load_json, save_json, ArtifactStore, METRICS_HISTORY_KEY};
use crate::error::Result;
use crate::training::EvaluationMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One training run's metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: EvaluationMetrics,
}

/// Reader/writer for the `metrics_history.json` artifact
pub struct MetricsHistory;

impl MetricsHistory {
    /// All entries, oldest first; empty if nothing was recorded yet
    pub fn load(store: &dyn ArtifactStore) -> Result<Vec<MetricsEntry>> {
        Ok(load_json(store, METRICS_HISTORY_KEY)?.unwrap_or_default())
    }

    /// Record `metrics` stamped with the current UTC time
    pub fn append(store: &dyn ArtifactStore, metrics: &EvaluationMetrics) -> Result<MetricsEntry> {
        Self::append_at(store, metrics, Utc::now())
    }

    pub fn append_at(
        store: &dyn ArtifactStore,
        metrics: &EvaluationMetrics,
        timestamp: DateTime<Utc>,
    ) -> Result<MetricsEntry> {
        let mut entries = Self::load(store)?;
        let entry = MetricsEntry {
            timestamp,
            metrics: *metrics,
        };
        entries.push(entry.clone());
        save_json(store, METRICS_HISTORY_KEY, &entries)?;
        Ok(entry)
    }

    /// Most recent entry by timestamp
    pub fn latest(store: &dyn ArtifactStore) -> Result<Option<MetricsEntry>> {
        Ok(Self::load(store)?
            .into_iter()
            .max_by_key(|entry| entry.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::InMemoryArtifactStore;
    use chrono::TimeZone;

    fn metrics(r2: f64) -> EvaluationMetrics {
        EvaluationMetrics { mae: 100.0, rmse: 150.0, r2 }
    }

    #[test]
    fn test_empty_history() {
        let store = InMemoryArtifactStore::new();
        assert!(MetricsHistory::load(&store).unwrap().is_empty());
        assert!(MetricsHistory::latest(&store).unwrap().is_none());
    }

    #[test]
    fn test_append_and_latest() {
        let store = InMemoryArtifactStore::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        MetricsHistory::append_at(&store, &metrics(0.7), t1).unwrap();
        MetricsHistory::append_at(&store, &metrics(0.9), t2).unwrap();

        let all = MetricsHistory::load(&store).unwrap();
        assert_eq!(all.len(), 2);
        let latest = MetricsHistory::latest(&store).unwrap().unwrap();
        assert_eq!(latest.timestamp, t2);
        assert_eq!(latest.metrics.r2, 0.9);
    }

    #[test]
    fn test_entry_json_is_flat() {
        let entry = MetricsEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            metrics: metrics(0.5),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["R2"], 0.5);
        assert!(json["timestamp"].is_string());
    }
}
