//! Artifact persistence
//!
//! The fitted encoding transform and the trained model are stored as
//! bincode blobs wrapped in a small checked envelope. Metrics and their
//! history are plain JSON so other tools can read them.

mod store;
pub mod history;

pub use store::{ArtifactStore, InMemoryArtifactStore, LocalArtifactStore};
pub use history::{MetricsEntry, MetricsHistory};

use crate::error::{AutoPriceError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

/// Fitted encoding transform
pub const TRANSFORM_KEY: &str = "preprocessor";
/// Trained regressor
pub const MODEL_KEY: &str = "car_price_model";
/// Latest evaluation metrics
pub const METRICS_KEY: &str = "metrics.json";
/// Every evaluation, oldest first
pub const METRICS_HISTORY_KEY: &str = "metrics_history.json";

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    magic: [u8; 4],
    format_version: u32,
    key: String,
    payload: Vec<u8>,
    checksum: u64,
}

impl ArtifactEnvelope {
    const MAGIC: [u8; 4] = *b"APRC";
    const VERSION: u32 = 2;

    fn new(key: &str, payload: Vec<u8>) -> Self {
        let checksum = xxh3_64(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            key: key.to_string(),
            payload,
            checksum,
        }
    }

    fn verify(&self, key: &str) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(AutoPriceError::SerializationError(format!(
                "artifact {} is not an autoprice artifact",
                key
            )));
        }
        if self.format_version != Self::VERSION {
            return Err(AutoPriceError::SerializationError(format!(
                "artifact {} has format version {}, expected {}",
                key,
                self.format_version,
                Self::VERSION
            )));
        }
        if xxh3_64(&self.payload) != self.checksum {
            return Err(AutoPriceError::SerializationError(format!(
                "artifact {} failed checksum verification",
                key
            )));
        }
        Ok(())
    }
}

/// Serialize `value` with bincode and store it under `key`
pub fn save_artifact<T: Serialize>(store: &dyn ArtifactStore, key: &str, value: &T) -> Result<()> {
    let payload = bincode::serialize(value)?;
    let envelope = ArtifactEnvelope::new(key, payload);
    let bytes = bincode::serialize(&envelope)?;
    store.put(key, &bytes)?;
    debug!(key, bytes = bytes.len(), "Saved artifact");
    Ok(())
}

/// Load a bincode artifact; [`AutoPriceError::ArtifactMissing`] if never stored
pub fn load_artifact<T: DeserializeOwned>(store: &dyn ArtifactStore, key: &str) -> Result<T> {
    let bytes = store
        .get(key)?
        .ok_or_else(|| AutoPriceError::ArtifactMissing(key.to_string()))?;
    let envelope: ArtifactEnvelope = bincode::deserialize(&bytes)?;
    envelope.verify(key)?;
    Ok(bincode::deserialize(&envelope.payload)?)
}

/// Store `value` as pretty-printed JSON
pub fn save_json<T: Serialize>(store: &dyn ArtifactStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    store.put(key, &json)
}

/// Load a JSON artifact, `None` if absent
pub fn load_json<T: DeserializeOwned>(store: &dyn ArtifactStore, key: &str) -> Result<Option<T>> {
    store
        .get(key)?
        .map(|bytes| serde_json::from_slice(&bytes).map_err(AutoPriceError::from))
        .transpose()
}
