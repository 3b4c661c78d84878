//! OS secure enclave backend via the system keyring.

use crate::{KeyValueStore, StorageError, StorageResult};
use keyring::Entry;
use tracing::debug;

/// Keyring-backed secure storage.
///
/// Routes through the OS credential service (Keychain on Apple platforms,
/// Keystore-backed keyring on Android builds that provide one). Sensitive
/// keys land here; everything else goes to the general store.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// Create a new keyring store scoped to a service name.
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> StorageResult<Entry> {
        Entry::new(&self.service, key).map_err(|e| StorageError::Platform(e.to_string()))
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        debug!(service = %self.service, key = %key, "Reading secret");
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Platform(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(service = %self.service, key = %key, "Writing secret");
        self.entry(key)?
            .set_password(value)
            .map_err(|e| StorageError::Platform(e.to_string()))
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        debug!(service = %self.service, key = %key, "Deleting secret");
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(StorageError::Platform(e.to_string())),
        }
    }
}
