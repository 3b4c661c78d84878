//! File-backed storage backend.

use crate::{KeyValueStore, StorageResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// JSON-file-backed key-value store.
///
/// This is the general (unencrypted) persistent store on native surfaces:
/// a single JSON object on disk, write-through on every mutation. Secrets
/// never land here; the router sends sensitive keys to the enclave.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open a file store at the given path, loading existing contents.
    ///
    /// An unreadable or corrupt file is treated as empty; the next write
    /// replaces it.
    pub fn new(path: PathBuf) -> Self {
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Store file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            data: Mutex::new(data),
        }
    }

    fn persist(&self, data: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        self.persist(&data)
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.data.lock().unwrap();
        let existed = data.remove(key).is_some();
        if existed {
            self.persist(&data)?;
        }
        Ok(existed)
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::new(path.clone());
        store.set("lastSignIn", "2025-01-01T00:00:00Z").unwrap();
        store.set("userEmail", "a@x.com").unwrap();

        // Re-open from disk
        let reopened = FileStore::new(path);
        assert_eq!(
            reopened.get("lastSignIn").unwrap(),
            Some("2025-01-01T00:00:00Z".to_string())
        );
        assert_eq!(
            reopened.get("userEmail").unwrap(),
            Some("a@x.com".to_string())
        );
    }

    #[test]
    fn test_remove_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store.json"));
        assert!(!store.remove("nope").unwrap());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileStore::new(path);
        assert_eq!(store.get("anything").unwrap(), None);
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap(), Some("value".to_string()));
    }
}
