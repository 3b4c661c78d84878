//! Storage key constants and the sensitivity predicate.

/// Storage keys used by the client.
pub struct StorageKeys;

impl StorageKeys {
    /// Timestamp of the last successful sign-in (RFC 3339)
    pub const LAST_SIGN_IN: &'static str = "lastSignIn";

    /// Timestamp of the last sign-up attempt (RFC 3339)
    pub const LAST_SIGN_UP_ATTEMPT: &'static str = "lastSignUpAttempt";

    /// Email of the signed-in user
    pub const USER_EMAIL: &'static str = "userEmail";

    /// Identity provider of the current session ("email", "google")
    pub const AUTH_PROVIDER: &'static str = "authProvider";

    /// Arbitrary app preferences (JSON)
    pub const USER_PREFERENCES: &'static str = "userPreferences";

    /// Persisted session record (JSON, routed to secure storage)
    pub const SESSION: &'static str = "authSession";
}

/// Returns true if a key holds credential material and must be routed to
/// the secure backend. Classification is by naming convention: any key
/// mentioning auth, token, or refresh is sensitive.
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("auth") || key.contains("token") || key.contains("refresh")
}
