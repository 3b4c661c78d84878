//! Credential storage for the lumen client.
//!
//! This crate provides the platform-routed persistence abstraction for
//! cached auth metadata:
//! - **Web**: a durable browser-local backend registered by the shell, or
//!   an in-memory fallback scoped to the process lifetime
//! - **Native (iOS / Android)**: sensitive keys in the OS secure enclave
//!   via the system keyring, everything else in a general JSON file store
//!
//! Routing is by naming convention (see [`is_sensitive_key`]); the
//! backends themselves are opaque [`KeyValueStore`] implementations.

mod file;
mod keys;
mod memory;
mod store;
mod traits;

#[cfg(feature = "keyring")]
mod enclave;

pub use file::FileStore;
pub use keys::{is_sensitive_key, StorageKeys};
pub use memory::MemoryStore;
pub use store::CredentialStore;
pub use traits::KeyValueStore;

#[cfg(feature = "keyring")]
pub use enclave::KeyringStore;

use lumen_core::{Paths, PlatformKind};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Service name used for all secure storage operations.
pub const SERVICE_NAME: &str = "app.lumen.client";

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Platform-specific storage error
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the credential store for a platform.
///
/// Web gets the in-memory fallback (the shell may instead register a
/// durable browser-local backend via [`CredentialStore::unified`]).
/// Native surfaces route sensitive keys to the OS enclave and the rest to
/// a file store under the client data directory. A missing enclave
/// degrades to memory with a warning; the cache is best-effort by design.
pub fn create_store(kind: PlatformKind, paths: &Paths) -> CredentialStore {
    match kind {
        PlatformKind::Web => {
            warn!("No durable browser-local store registered; using in-memory store (cleared on reload)");
            CredentialStore::in_memory()
        }
        PlatformKind::NativeIos | PlatformKind::NativeAndroid => {
            let general: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(paths.store_file()));

            #[cfg(feature = "keyring")]
            let sensitive: Arc<dyn KeyValueStore> = Arc::new(KeyringStore::new(SERVICE_NAME));

            #[cfg(not(feature = "keyring"))]
            let sensitive: Arc<dyn KeyValueStore> = {
                warn!("No secure enclave backend compiled in; sensitive keys held in memory only");
                Arc::new(MemoryStore::new())
            };

            CredentialStore::new(sensitive, general)
        }
    }
}
