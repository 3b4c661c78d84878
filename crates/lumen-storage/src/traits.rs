//! Storage trait definitions.

use crate::StorageResult;

/// Trait for key-value storage backends.
///
/// Implemented by the in-memory fallback, the file-backed general store,
/// the OS secure enclave, and whatever durable store the embedding shell
/// registers. Backends are opaque to the router: classification of keys
/// happens above this trait.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a value, overwriting any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value. Returns false if the key did not exist.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
