//! End-to-end tests for the auth operations against a mock backend.

use chrono::{Duration, Utc};
use lumen_auth::{
    AuthClient, AuthError, AuthEvent, GoogleIdentity, GoogleProvider, GoogleSignIn,
    NativePlatform, Platform, RedirectKind, Session, User, WebPlatform,
};
use lumen_core::Config;
use lumen_storage::{CredentialStore, KeyValueStore, MemoryStore, StorageKeys};
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Recorded (event, access token) pairs from the broadcaster.
type EventLog = Arc<Mutex<Vec<(AuthEvent, Option<String>)>>>;

struct Harness {
    client: AuthClient,
    store: CredentialStore,
    secure: Arc<MemoryStore>,
    general: Arc<MemoryStore>,
    events: EventLog,
    _subscription: lumen_auth::Subscription,
}

fn harness(server: &MockServer, platform: Arc<dyn Platform>) -> Harness {
    let config = Config {
        api_url: server.uri(),
        publishable_key: "test-key".to_string(),
        ..Config::default()
    };

    let secure = Arc::new(MemoryStore::new());
    let general = Arc::new(MemoryStore::new());
    let store = CredentialStore::new(secure.clone(), general.clone());

    let client = AuthClient::new(&config, platform, store.clone());

    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let subscription = client.on_auth_change(move |event, session| {
        events_clone
            .lock()
            .unwrap()
            .push((event, session.map(|s| s.access_token.clone())));
    });

    Harness {
        client,
        store,
        secure,
        general,
        events,
        _subscription: subscription,
    }
}

fn token_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 3600,
        "user": {
            "id": "user-1",
            "email": "a@x.com",
            "app_metadata": { "provider": "email" }
        }
    }))
}

fn user_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "user-1",
        "email": "a@x.com"
    }))
}

#[tokio::test]
async fn invalid_credentials_surface_an_error_and_cache_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(WebPlatform::new("https://app.example.com")));

    let err = h
        .client
        .sign_in_with_email("a@x.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(_)));
    assert!(err.to_string().contains("Invalid login credentials"));

    // Nothing cached, nothing announced.
    assert_eq!(h.store.get(StorageKeys::SESSION), None);
    assert_eq!(h.store.get(StorageKeys::LAST_SIGN_IN), None);
    assert!(h.client.current_user().is_none());
    assert!(h.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn successful_sign_in_notifies_once_and_caches_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(token_response("at-1", "rt-1"))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(WebPlatform::new("https://app.example.com")));

    let session = h
        .client
        .sign_in_with_email("a@x.com", "pw123456")
        .await
        .unwrap();
    assert_eq!(session.access_token, "at-1");
    assert_eq!(session.user.id, "user-1");

    let events = h.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![(AuthEvent::SignedIn, Some("at-1".to_string()))]
    );

    assert!(h.store.get(StorageKeys::LAST_SIGN_IN).is_some());
    assert_eq!(
        h.store.get(StorageKeys::USER_EMAIL),
        Some("a@x.com".to_string())
    );
    assert_eq!(
        h.store.get(StorageKeys::AUTH_PROVIDER),
        Some("email".to_string())
    );

    // The session record is routed to the secure backend.
    assert!(h.secure.get(StorageKeys::SESSION).unwrap().is_some());
    assert!(h.general.get(StorageKeys::SESSION).unwrap().is_none());
}

#[tokio::test]
async fn web_fragment_bootstrap_installs_tokens_and_scrubs_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(user_response())
        .mount(&server)
        .await;

    let scrubbed: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let scrubbed_clone = scrubbed.clone();
    let platform = WebPlatform::new("https://app.example.com").with_replace_url_hook(Box::new(
        move |url: &Url| {
            *scrubbed_clone.lock().unwrap() = Some(url.to_string());
        },
    ));

    let h = harness(&server, Arc::new(platform));

    let session = h
        .client
        .bootstrap(Some(
            "https://app.example.com/welcome#access_token=T1&refresh_token=T2",
        ))
        .await
        .unwrap()
        .expect("fragment tokens must install a session");

    assert_eq!(session.access_token, "T1");
    assert_eq!(session.refresh_token, "T2");

    // The visible address no longer carries the fragment.
    assert_eq!(
        *scrubbed.lock().unwrap(),
        Some("https://app.example.com/welcome".to_string())
    );

    let events = h.events.lock().unwrap();
    assert_eq!(*events, vec![(AuthEvent::SignedIn, Some("T1".to_string()))]);
}

#[tokio::test]
async fn error_only_fragment_falls_through_to_no_session() {
    let server = MockServer::start().await;
    let h = harness(&server, Arc::new(WebPlatform::new("https://app.example.com")));

    let session = h
        .client
        .bootstrap(Some("https://app.example.com/#error=access_denied"))
        .await
        .unwrap();
    assert!(session.is_none());

    let events = h.events.lock().unwrap();
    assert_eq!(*events, vec![(AuthEvent::InitialSession, None)]);
}

#[tokio::test]
async fn bootstrap_restores_and_refreshes_persisted_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(token_response("at-new", "rt-new"))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(NativePlatform::ios("lumen")));

    // Seed an expired persisted session.
    let expired = Session {
        access_token: "at-old".to_string(),
        refresh_token: "rt-old".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
        user: User {
            id: "user-1".to_string(),
            email: Some("a@x.com".to_string()),
            display_name: None,
            avatar_url: None,
            provider: Some("email".to_string()),
        },
    };
    h.store
        .set(
            StorageKeys::SESSION,
            &serde_json::to_string(&expired).unwrap(),
        )
        .unwrap();

    let session = h.client.bootstrap(None).await.unwrap().unwrap();
    assert_eq!(session.access_token, "at-new");
    assert!(!session.is_expired());

    let events = h.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            (AuthEvent::TokenRefreshed, Some("at-new".to_string())),
            (AuthEvent::InitialSession, Some("at-new".to_string())),
        ]
    );
}

#[tokio::test]
async fn failed_refresh_discards_the_cached_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error_description": "Invalid Refresh Token"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(NativePlatform::ios("lumen")));

    let expired = Session {
        access_token: "at-old".to_string(),
        refresh_token: "rt-old".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
        user: User {
            id: "user-1".to_string(),
            email: None,
            display_name: None,
            avatar_url: None,
            provider: None,
        },
    };
    h.store
        .set(
            StorageKeys::SESSION,
            &serde_json::to_string(&expired).unwrap(),
        )
        .unwrap();

    let session = h.client.bootstrap(None).await.unwrap();
    assert!(session.is_none());
    assert_eq!(h.store.get(StorageKeys::SESSION), None);
}

#[tokio::test]
async fn deep_link_installs_session_and_returns_operation_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(user_response())
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(NativePlatform::ios("lumen")));

    let outcome = h
        .client
        .handle_deep_link("lumen://reset-password?access_token=T1&refresh_token=T2&type=recovery")
        .await
        .unwrap();
    assert_eq!(outcome, Some(RedirectKind::ResetPassword));

    let session = h.client.get_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "T1");
    assert_eq!(session.refresh_token, "T2");

    let events = h.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![(AuthEvent::PasswordRecovery, Some("T1".to_string()))]
    );
}

#[tokio::test]
async fn sign_up_without_session_is_pending_verification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-7",
            "email": "a@x.com"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(NativePlatform::android("lumen")));

    let outcome = h
        .client
        .sign_up_with_email("a@x.com", "pw123456")
        .await
        .unwrap();
    assert_eq!(outcome.user.id, "user-7");
    assert!(outcome.session.is_none(), "confirmation pending, not authenticated");

    // No session was announced; the attempt itself is cached.
    assert!(h.events.lock().unwrap().is_empty());
    assert!(h.store.get(StorageKeys::LAST_SIGN_UP_ATTEMPT).is_some());
    assert_eq!(
        h.store.get(StorageKeys::AUTH_PROVIDER),
        Some("email".to_string())
    );
}

#[tokio::test]
async fn sign_up_with_immediate_session_is_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(token_response("at-5", "rt-5"))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(WebPlatform::new("https://app.example.com")));

    let outcome = h
        .client
        .sign_up_with_email("a@x.com", "pw123456")
        .await
        .unwrap();
    let session = outcome.session.expect("immediate session expected");
    assert_eq!(session.access_token, "at-5");

    let events = h.events.lock().unwrap();
    assert_eq!(*events, vec![(AuthEvent::SignedIn, Some("at-5".to_string()))]);
}

#[tokio::test]
async fn sign_out_clears_metadata_even_when_backend_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(token_response("at-1", "rt-1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(WebPlatform::new("https://app.example.com")));

    h.client
        .sign_in_with_email("a@x.com", "pw123456")
        .await
        .unwrap();
    h.store
        .set(StorageKeys::USER_PREFERENCES, r#"{"theme":"dark"}"#)
        .unwrap();

    let result = h.client.sign_out().await;
    assert!(result.is_err(), "backend rejection is still surfaced");

    // Local teardown happened anyway.
    assert!(h.client.current_user().is_none());
    for key in [
        StorageKeys::LAST_SIGN_IN,
        StorageKeys::USER_EMAIL,
        StorageKeys::USER_PREFERENCES,
        StorageKeys::AUTH_PROVIDER,
        StorageKeys::SESSION,
    ] {
        assert_eq!(h.store.get(key), None, "{key} should be gone");
    }

    let events = h.events.lock().unwrap();
    assert_eq!(events.last().unwrap(), &(AuthEvent::SignedOut, None));
}

#[tokio::test]
async fn sign_out_success_clears_everything() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(token_response("at-1", "rt-1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(WebPlatform::new("https://app.example.com")));

    h.client
        .sign_in_with_email("a@x.com", "pw123456")
        .await
        .unwrap();
    h.client.sign_out().await.unwrap();

    assert_eq!(h.store.get(StorageKeys::SESSION), None);
    assert!(!h.client.has_previous_sign_in().await);
}

/// Provider double for the native Google handshake.
struct FakeGoogle {
    id_token: Option<String>,
    previously_signed_in: bool,
}

impl GoogleProvider for FakeGoogle {
    fn sign_in(&self) -> lumen_auth::AuthResult<GoogleIdentity> {
        Ok(GoogleIdentity {
            id_token: self.id_token.clone(),
            email: Some("a@x.com".to_string()),
        })
    }

    fn sign_out(&self) -> lumen_auth::AuthResult<()> {
        Ok(())
    }

    fn has_previous_sign_in(&self) -> bool {
        self.previously_signed_in
    }
}

#[tokio::test]
async fn native_google_sign_in_exchanges_identity_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "id_token"))
        .respond_with(token_response("at-g", "rt-g"))
        .mount(&server)
        .await;

    let platform = NativePlatform::ios("lumen").with_google_provider(Box::new(FakeGoogle {
        id_token: Some("google-id-token".to_string()),
        previously_signed_in: true,
    }));
    let h = harness(&server, Arc::new(platform));

    match h.client.sign_in_with_google().await.unwrap() {
        GoogleSignIn::Session(session) => assert_eq!(session.access_token, "at-g"),
        GoogleSignIn::Redirect(_) => panic!("native sign-in must not redirect"),
    }

    assert_eq!(
        h.store.get(StorageKeys::AUTH_PROVIDER),
        Some("google".to_string())
    );
    assert!(h.client.has_previous_sign_in().await);
}

#[tokio::test]
async fn native_google_sign_in_fails_without_identity_token() {
    let server = MockServer::start().await;
    let platform = NativePlatform::android("lumen").with_google_provider(Box::new(FakeGoogle {
        id_token: None,
        previously_signed_in: false,
    }));
    let h = harness(&server, Arc::new(platform));

    let err = h.client.sign_in_with_google().await.unwrap_err();
    assert!(matches!(err, AuthError::OAuth(_)));
    assert!(h.client.current_user().is_none());
}

#[tokio::test]
async fn update_password_emits_user_updated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(token_response("at-1", "rt-1"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer at-1"))
        .respond_with(user_response())
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(WebPlatform::new("https://app.example.com")));

    h.client
        .sign_in_with_email("a@x.com", "pw123456")
        .await
        .unwrap();
    let user = h.client.update_password("new-password").await.unwrap();
    assert_eq!(user.id, "user-1");

    let events = h.events.lock().unwrap();
    assert_eq!(
        events.last().unwrap(),
        &(AuthEvent::UserUpdated, Some("at-1".to_string()))
    );
}

#[tokio::test]
async fn reset_password_uses_platform_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(query_param("redirect_to", "lumen://auth/callback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let h = harness(&server, Arc::new(NativePlatform::ios("lumen")));
    h.client.reset_password("a@x.com").await.unwrap();
}
