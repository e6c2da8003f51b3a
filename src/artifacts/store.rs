//! Artifact storage backends

use crate::error::{AutoPriceError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keyed blob storage shared by training and inference.
///
/// Writes overwrite. No versioning or locking across runs; the caller owns
/// exclusive access while a retrain is in flight.
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous value
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Bytes stored under `key`, `None` if never written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// One file per key under a root directory
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// The directory is created lazily on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\']);
        if !valid {
            return Err(AutoPriceError::ValidationError(format!(
                "invalid artifact key: {:?}",
                key
            )));
        }
        Ok(self.root.join(key))
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;

        // Write then rename so a reader never sees a half-written artifact
        let tmp = self.root.join(format!(".{}.tmp", key));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;

        debug!(key, bytes = bytes.len(), path = %path.display(), "Wrote artifact");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path_for(key)?.is_file())
    }
}

/// Process-local store, used by tests and one-shot runs
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs.write().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("artifacts"));

        assert!(!store.exists("model").unwrap());
        assert_eq!(store.get("model").unwrap(), None);

        store.put("model", b"v1").unwrap();
        store.put("model", b"v2").unwrap();
        assert!(store.exists("model").unwrap());
        assert_eq!(store.get("model").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_local_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        assert!(matches!(
            store.put("../escape", b"x"),
            Err(AutoPriceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryArtifactStore::new();
        assert!(store.is_empty());
        store.put("b", b"2").unwrap();
        store.put("a", b"1").unwrap();
        assert_eq!(store.keys(), vec!["a", "b"]);
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert!(!store.exists("c").unwrap());
    }
}
