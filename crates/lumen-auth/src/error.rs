//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
///
/// Every public auth operation returns these as values; the UI layer is
/// the only place that turns them into user-visible messaging.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Backend rejected the request (duplicate account, expired token, ...)
    #[error("Backend error: {0}")]
    Backend(String),

    /// OAuth / redirect flow error
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Token refresh error
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// No current session
    #[error("Not signed in")]
    NotSignedIn,

    /// Identity-provider SDK is absent on this platform
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] lumen_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
