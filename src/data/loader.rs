//! Inventory export loading

use super::ListingRecord;
use crate::error::{AutoPriceError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Load a JSON array of listing records (an inventory export file)
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<ListingRecord>> {
    let path = path.as_ref();
    let start = Instant::now();

    let file = File::open(path).map_err(|e| {
        AutoPriceError::DataError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let records: Vec<ListingRecord> = serde_json::from_reader(BufReader::new(file))?;

    info!(
        path = %path.display(),
        records = records.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded inventory records"
    );
    Ok(records)
}

/// Write listing records as a pretty-printed JSON array
pub fn save_records(path: impl AsRef<Path>, records: &[ListingRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)?;
    debug!(path = %path.display(), records = records.len(), "Saved inventory records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports").join("inventory.json");
        let records = vec![
            ListingRecord::new("A1").with_title("2019 Ford F-150").with_price(31000.0),
            ListingRecord::new("B2").with_title("Tesla Model 3"),
        ];

        save_records(&path, &records).unwrap();
        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_missing_file_is_data_error() {
        let err = load_records("/nonexistent/inventory.json").unwrap_err();
        assert!(matches!(err, AutoPriceError::DataError(_)));
    }
}
