//! The platform-routed credential store.

use crate::{is_sensitive_key, KeyValueStore, MemoryStore, StorageResult};
use std::sync::Arc;
use tracing::warn;

/// Platform-routed key-value persistence for cached auth metadata.
///
/// Holds two backends: sensitive keys (per the naming predicate) go to the
/// secure route, everything else to the general route. On the web surface
/// both routes point at the same backend.
///
/// Storage here is cache, never the source of truth: reads degrade to
/// `None` on backend failure, and callers treat writes as best-effort.
#[derive(Clone)]
pub struct CredentialStore {
    sensitive: Arc<dyn KeyValueStore>,
    general: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    /// Native routing: a secure enclave for sensitive keys and a general
    /// persistent store for the rest.
    pub fn new(sensitive: Arc<dyn KeyValueStore>, general: Arc<dyn KeyValueStore>) -> Self {
        Self { sensitive, general }
    }

    /// Web routing: a single backend serves both routes (the durable
    /// browser-local store registered by the shell, or the in-memory
    /// fallback).
    pub fn unified(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sensitive: store.clone(),
            general: store,
        }
    }

    /// In-memory store for both routes. The web fallback when no durable
    /// store is available, and the standard test configuration.
    pub fn in_memory() -> Self {
        Self::unified(Arc::new(MemoryStore::new()))
    }

    fn route(&self, key: &str) -> &dyn KeyValueStore {
        if is_sensitive_key(key) {
            &*self.sensitive
        } else {
            &*self.general
        }
    }

    /// Read a value. Backend failures degrade to `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.route(key).get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Credential store read failed");
                None
            }
        }
    }

    /// Write a value to the routed backend.
    pub fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.route(key).set(key, value)
    }

    /// Remove a value. Removing a missing key succeeds.
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        self.route(key).remove(key)?;
        Ok(())
    }

    /// Remove several keys. Every key is attempted; the first backend
    /// failure (if any) is reported after the sweep. Missing keys are not
    /// failures.
    pub fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.route(key).remove(key) {
                warn!(key = %key, error = %e, "Credential store remove failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
