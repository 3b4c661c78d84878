//! Session and user types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity record for the signed-in user.
///
/// Always derived from backend responses; the client never constructs one
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User UUID from the auth backend
    pub id: String,
    /// Email address, when the provider supplies one
    #[serde(default)]
    pub email: Option<String>,
    /// Display name from provider metadata
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar URL from provider metadata
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Identity provider that produced this user ("email", "google")
    #[serde(default)]
    pub provider: Option<String>,
}

/// The client-side copy of a backend-owned session.
///
/// At most one current session exists at any time; installing a new one
/// fully replaces the old one. The backend remains the source of truth
/// for validity; this is a cached bearer-credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer access token
    pub access_token: String,
    /// Refresh token (empty when the redirect artifact carried none)
    pub refresh_token: String,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    /// The identity this session belongs to
    pub user: User,
}

impl Session {
    /// True once the access token's expiry has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_user() -> User {
        User {
            id: "user-123".to_string(),
            email: Some("test@example.com".to_string()),
            display_name: None,
            avatar_url: None,
            provider: Some("email".to_string()),
        }
    }

    #[test]
    fn test_session_expiry() {
        let mut session = Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: test_user(),
        };
        assert!(!session.is_expired());

        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_session_serde_round_trip() {
        let session = Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: test_user(),
        };

        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
