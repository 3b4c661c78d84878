//! The authoritative session and the operations that mutate it.
//!
//! One [`AuthClient`] instance owns the client-side view of "is there a
//! valid session, and whose is it". It reconciles redirect artifacts,
//! deep links, and the persisted session into a single slot, broadcasts
//! every change, and drives the backend for all mutations. The instance
//! is constructed explicitly and passed by reference to whoever needs it;
//! there is no process-wide singleton.
//!
//! Concurrency: operations are not de-duplicated. Two overlapping calls
//! both run and the session slot reflects whichever finishes last.

use crate::api::AuthApi;
use crate::broadcast::{AuthBroadcaster, AuthEvent, Subscription};
use crate::error::{AuthError, AuthResult};
use crate::platform::{require_google, Platform};
use crate::redirect::{without_fragment, RedirectArtifact, RedirectKind};
use crate::session::{Session, User};
use chrono::{Duration, Utc};
use lumen_core::{Config, PlatformKind};
use lumen_storage::{CredentialStore, StorageKeys};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;

/// Access-token lifetime assumed for sessions installed from redirect
/// artifacts, which carry no expiry of their own.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Result of a sign-up attempt.
///
/// `session` is `None` when the backend requires email confirmation
/// before the account is usable. The UI treats that as pending
/// verification, not as authenticated.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    /// The created (possibly unconfirmed) user
    pub user: User,
    /// The installed session, when no confirmation step was required
    pub session: Option<Session>,
}

/// How a Google sign-in proceeds on the current platform.
#[derive(Debug, Clone)]
pub enum GoogleSignIn {
    /// Web: navigate the browser to this URL; tokens come back through
    /// the address fragment and the next bootstrap pass.
    Redirect(String),
    /// Native: the handshake completed and this session is installed.
    Session(Session),
}

/// Client-side auth core.
pub struct AuthClient {
    api: AuthApi,
    platform: Arc<dyn Platform>,
    store: CredentialStore,
    broadcaster: AuthBroadcaster,
    current: Mutex<Option<Session>>,
}

impl AuthClient {
    /// Create a client for a platform with its credential store.
    pub fn new(config: &Config, platform: Arc<dyn Platform>, store: CredentialStore) -> Self {
        Self {
            api: AuthApi::new(&config.api_url, &config.publishable_key),
            platform,
            store,
            broadcaster: AuthBroadcaster::new(),
            current: Mutex::new(None),
        }
    }

    /// Register an observer for session changes.
    pub fn on_auth_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(callback)
    }

    /// The user behind the current session, if any.
    pub fn current_user(&self) -> Option<User> {
        self.current.lock().unwrap().as_ref().map(|s| s.user.clone())
    }

    // ==========================================
    // Session bootstrap
    // ==========================================

    /// Resolve the authoritative session at startup.
    ///
    /// On the web surface, a redirect artifact in the current address
    /// fragment wins: the session is installed from its tokens and the
    /// fragment is scrubbed from the visible address so a refresh does
    /// not reprocess it. Otherwise (and always on native) the persisted
    /// session is restored (refreshing expired tokens) and the result,
    /// session or none, is announced as the initial state.
    pub async fn bootstrap(&self, current_url: Option<&str>) -> AuthResult<Option<Session>> {
        if self.platform.kind() == PlatformKind::Web {
            if let Some(raw) = current_url {
                if let Ok(url) = Url::parse(raw) {
                    if let Some(artifact) = RedirectArtifact::from_web_fragment(&url) {
                        debug!("Consuming redirect artifact from address fragment");
                        let refresh = artifact.refresh_token.as_deref().unwrap_or("");
                        let session = self
                            .install_tokens(&artifact.access_token, refresh, AuthEvent::SignedIn)
                            .await?;
                        self.platform.replace_visible_url(&without_fragment(&url));
                        return Ok(Some(session));
                    }
                }
            }
        }

        let session = self.restore_persisted().await;
        self.broadcaster
            .emit(AuthEvent::InitialSession, session.as_ref());
        Ok(session)
    }

    /// Reconcile an incoming deep link (native surfaces).
    ///
    /// Recognized links install the session they carry and return the
    /// operation type so the UI can branch (e.g., navigate to the
    /// password-reset screen). Anything else (wrong path, missing
    /// parameters, unparseable URL) resolves to `None` silently.
    pub async fn handle_deep_link(&self, raw_url: &str) -> AuthResult<Option<RedirectKind>> {
        if !self.platform.kind().is_native() {
            return Ok(None);
        }

        let Ok(url) = Url::parse(raw_url) else {
            debug!(url = %raw_url, "Ignoring unparseable deep link");
            return Ok(None);
        };
        let Some(artifact) = RedirectArtifact::from_deep_link(&url) else {
            return Ok(None);
        };

        info!(kind = ?artifact.kind, "Consuming deep-link artifact");
        let event = match artifact.kind {
            RedirectKind::ResetPassword => AuthEvent::PasswordRecovery,
            _ => AuthEvent::SignedIn,
        };
        let refresh = artifact.refresh_token.as_deref().unwrap_or("");
        self.install_tokens(&artifact.access_token, refresh, event)
            .await?;
        Ok(Some(artifact.kind))
    }

    /// Install a session explicitly from a token pair.
    ///
    /// The user record is materialized from the backend; a rejected
    /// access token therefore installs nothing.
    pub async fn set_session_from_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> AuthResult<Session> {
        self.install_tokens(access_token, refresh_token, AuthEvent::SignedIn)
            .await
    }

    // ==========================================
    // Auth operations
    // ==========================================

    /// Create an account with an email-verification callback appropriate
    /// to the current platform.
    pub async fn sign_up_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<SignUpOutcome> {
        let redirect = self.platform.email_redirect_url();
        let response = self.api.sign_up(email, password, &redirect).await?;
        let user = User::from(response.user);

        let session = match response.tokens {
            Some(tokens) => {
                let session = Session {
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token,
                    expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
                    user: user.clone(),
                };
                self.replace_session(Some(session.clone()), AuthEvent::SignedIn);
                Some(session)
            }
            None => {
                info!(email = %email, "Sign-up accepted; email confirmation pending");
                None
            }
        };

        self.cache_write(StorageKeys::LAST_SIGN_UP_ATTEMPT, &Utc::now().to_rfc3339());
        self.cache_write(StorageKeys::AUTH_PROVIDER, "email");

        Ok(SignUpOutcome { user, session })
    }

    /// Exchange email/password credentials for a session.
    pub async fn sign_in_with_email(&self, email: &str, password: &str) -> AuthResult<Session> {
        let grant = self.api.token_password(email, password).await?;
        let session = self.session_from_grant(grant);

        info!(user_id = %session.user.id, "Signed in with email");
        self.replace_session(Some(session.clone()), AuthEvent::SignedIn);

        let cached_email = session.user.email.clone();
        self.cache_sign_in_metadata(cached_email.as_deref().unwrap_or(email), "email");
        Ok(session)
    }

    /// Sign in with Google.
    ///
    /// Web delegates to the backend's redirect-OAuth flow with forced
    /// re-consent; the session arrives via the next [`bootstrap`] pass.
    /// Native runs the platform's sign-in UI and exchanges the identity
    /// token directly; a handshake that yields no token is an explicit
    /// failure, not a silent no-op.
    ///
    /// [`bootstrap`]: AuthClient::bootstrap
    pub async fn sign_in_with_google(&self) -> AuthResult<GoogleSignIn> {
        if self.platform.kind() == PlatformKind::Web {
            let url = self
                .api
                .authorize_url("google", &self.platform.email_redirect_url(), true);
            info!("Handing off to redirect-based Google sign-in");
            return Ok(GoogleSignIn::Redirect(url));
        }

        let provider = require_google(self.platform.as_ref())?;
        let identity = provider.sign_in()?;
        let id_token = identity.id_token.ok_or_else(|| {
            AuthError::OAuth("Google handshake returned no identity token".to_string())
        })?;

        let session = self.exchange_google_token(&id_token).await?;
        Ok(GoogleSignIn::Session(session))
    }

    /// Token-only Google sign-in, for shells that run the handshake in
    /// their own UI layer and hand over the resulting token.
    pub async fn sign_in_with_google_token(&self, id_token: &str) -> AuthResult<Session> {
        self.exchange_google_token(id_token).await
    }

    /// Tear down the session.
    ///
    /// On native the provider session is cleared first, best-effort.
    /// Local teardown (session slot, persisted copy, cached metadata)
    /// happens regardless of the backend call's outcome; a backend
    /// failure is still surfaced to the caller.
    pub async fn sign_out(&self) -> AuthResult<()> {
        if self.platform.kind().is_native() {
            if let Some(google) = self.platform.google() {
                if let Err(e) = google.sign_out() {
                    warn!(error = %e, "Provider sign-out failed");
                }
            }
        }

        let access_token = self
            .current
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone());
        let backend_result = match access_token {
            Some(token) => self.api.sign_out(&token).await,
            None => Ok(()),
        };

        self.replace_session(None, AuthEvent::SignedOut);
        if let Err(e) = self.store.remove_many(&[
            StorageKeys::LAST_SIGN_IN,
            StorageKeys::USER_EMAIL,
            StorageKeys::USER_PREFERENCES,
            StorageKeys::AUTH_PROVIDER,
        ]) {
            warn!(error = %e, "Failed to clear cached metadata");
        }
        info!("Signed out");

        backend_result
    }

    /// Send a password-reset email with a platform-appropriate callback.
    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        self.api
            .recover(email, &self.platform.email_redirect_url())
            .await
    }

    /// Update the signed-in user's password.
    pub async fn update_password(&self, new_password: &str) -> AuthResult<User> {
        let session = self
            .get_session()
            .await?
            .ok_or(AuthError::NotSignedIn)?;
        let api_user = self
            .api
            .update_user_password(&session.access_token, new_password)
            .await?;
        let user = User::from(api_user);

        let updated = {
            let mut current = self.current.lock().unwrap();
            current.as_mut().map(|session| {
                session.user = user.clone();
                session.clone()
            })
        };
        if let Some(session) = updated {
            self.persist_session(&session);
            self.broadcaster.emit(AuthEvent::UserUpdated, Some(&session));
        }

        Ok(user)
    }

    /// The current session, restored and refreshed as needed.
    pub async fn get_session(&self) -> AuthResult<Option<Session>> {
        Ok(self.restore_persisted().await)
    }

    /// Whether this user has signed in before on this surface.
    ///
    /// Native defers to the provider SDK's own flag when one is wired
    /// up; otherwise (and always on web) this is "a session resolves".
    pub async fn has_previous_sign_in(&self) -> bool {
        match self.platform.google() {
            Some(google) if self.platform.kind().is_native() => google.has_previous_sign_in(),
            _ => self.restore_persisted().await.is_some(),
        }
    }

    // ==========================================
    // Internals
    // ==========================================

    async fn exchange_google_token(&self, id_token: &str) -> AuthResult<Session> {
        let grant = self.api.token_id_token("google", id_token).await?;
        let session = self.session_from_grant(grant);

        info!(user_id = %session.user.id, "Signed in with Google");
        self.replace_session(Some(session.clone()), AuthEvent::SignedIn);

        self.cache_write(StorageKeys::LAST_SIGN_IN, &Utc::now().to_rfc3339());
        if let Some(email) = &session.user.email {
            self.cache_write(StorageKeys::USER_EMAIL, email);
        }
        self.cache_write(StorageKeys::AUTH_PROVIDER, "google");
        Ok(session)
    }

    async fn install_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
        event: AuthEvent,
    ) -> AuthResult<Session> {
        let api_user = self.api.get_user(access_token).await?;
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: Utc::now() + Duration::seconds(DEFAULT_EXPIRES_IN_SECS),
            user: User::from(api_user),
        };
        self.replace_session(Some(session.clone()), event);
        Ok(session)
    }

    fn session_from_grant(&self, grant: crate::api::TokenResponse) -> Session {
        Session {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: Utc::now() + Duration::seconds(grant.expires_in),
            user: User::from(grant.user),
        }
    }

    /// Resolve a session from memory or the persisted cache, refreshing
    /// expired tokens. Failures degrade to no session; the cache is
    /// never the source of truth.
    async fn restore_persisted(&self) -> Option<Session> {
        let candidate = self
            .current
            .lock()
            .unwrap()
            .clone()
            .or_else(|| self.load_cached_session());
        let session = candidate?;

        if !session.is_expired() {
            *self.current.lock().unwrap() = Some(session.clone());
            return Some(session);
        }

        self.refresh_session(&session).await
    }

    fn load_cached_session(&self) -> Option<Session> {
        let raw = self.store.get(StorageKeys::SESSION)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Persisted session is unreadable, discarding");
                if let Err(e) = self.store.remove(StorageKeys::SESSION) {
                    warn!(error = %e, "Failed to remove unreadable session");
                }
                None
            }
        }
    }

    async fn refresh_session(&self, expired: &Session) -> Option<Session> {
        if expired.refresh_token.is_empty() {
            debug!("Session expired with no refresh token");
            self.drop_session_quietly();
            return None;
        }

        match self.api.token_refresh(&expired.refresh_token).await {
            Ok(grant) => {
                let session = self.session_from_grant(grant);
                info!(user_id = %session.user.id, "Session tokens refreshed");
                self.replace_session(Some(session.clone()), AuthEvent::TokenRefreshed);
                Some(session)
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, discarding cached session");
                self.drop_session_quietly();
                None
            }
        }
    }

    /// Discard the session without treating it as a user-driven sign-out.
    /// Observers are only told when an in-memory session actually went
    /// away; a stale disk cache disappearing is not a state change.
    fn drop_session_quietly(&self) {
        let had_current = self.current.lock().unwrap().take().is_some();
        if let Err(e) = self.store.remove(StorageKeys::SESSION) {
            warn!(error = %e, "Failed to remove cached session");
        }
        if had_current {
            self.broadcaster.emit(AuthEvent::SignedOut, None);
        }
    }

    /// Replace the session slot wholesale and announce the change. The
    /// persisted copy follows as a post-commit write that never affects
    /// the outcome.
    fn replace_session(&self, session: Option<Session>, event: AuthEvent) {
        {
            let mut current = self.current.lock().unwrap();
            *current = session.clone();
        }

        match &session {
            Some(s) => self.persist_session(s),
            None => {
                if let Err(e) = self.store.remove(StorageKeys::SESSION) {
                    warn!(error = %e, "Failed to remove cached session");
                }
            }
        }

        self.broadcaster.emit(event, session.as_ref());
    }

    fn persist_session(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(json) => self.cache_write(StorageKeys::SESSION, &json),
            Err(e) => warn!(error = %e, "Failed to encode session for caching"),
        }
    }

    /// Post-commit cache write: best-effort, never affects the outcome.
    fn cache_write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    fn cache_sign_in_metadata(&self, email: &str, provider: &str) {
        self.cache_write(StorageKeys::LAST_SIGN_IN, &Utc::now().to_rfc3339());
        self.cache_write(StorageKeys::USER_EMAIL, email);
        self.cache_write(StorageKeys::AUTH_PROVIDER, provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{NativePlatform, WebPlatform};

    fn test_client(platform: Arc<dyn Platform>) -> AuthClient {
        let config = Config {
            api_url: "http://127.0.0.1:1".to_string(),
            publishable_key: "test-key".to_string(),
            ..Config::default()
        };
        AuthClient::new(&config, platform, CredentialStore::in_memory())
    }

    #[test]
    fn test_no_user_before_bootstrap() {
        let client = test_client(Arc::new(WebPlatform::new("https://app.example.com")));
        assert!(client.current_user().is_none());
    }

    #[tokio::test]
    async fn test_deep_links_are_native_only() {
        let client = test_client(Arc::new(WebPlatform::new("https://app.example.com")));
        let outcome = client
            .handle_deep_link("lumen://reset-password?access_token=T1&type=recovery")
            .await
            .unwrap();
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn test_unrecognized_deep_link_is_ignored() {
        let client = test_client(Arc::new(NativePlatform::ios("lumen")));
        // No network call happens for an unrecognized path, so the dead
        // api_url above is never touched.
        let outcome = client
            .handle_deep_link("lumen://open-note?id=42")
            .await
            .unwrap();
        assert_eq!(outcome, None);

        let outcome = client.handle_deep_link("not a url").await.unwrap();
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn test_google_without_sdk_is_unavailable() {
        let client = test_client(Arc::new(NativePlatform::ios("lumen")));
        let err = client.sign_in_with_google().await.unwrap_err();
        assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_web_google_returns_redirect() {
        let client = test_client(Arc::new(WebPlatform::new("https://app.example.com")));
        match client.sign_in_with_google().await.unwrap() {
            GoogleSignIn::Redirect(url) => {
                assert!(url.contains("provider=google"));
                assert!(url.contains("prompt=consent"));
            }
            GoogleSignIn::Session(_) => panic!("web sign-in must not produce a session directly"),
        }
    }

    #[tokio::test]
    async fn test_update_password_requires_session() {
        let client = test_client(Arc::new(WebPlatform::new("https://app.example.com")));
        let err = client.update_password("new-password").await.unwrap_err();
        assert!(matches!(err, AuthError::NotSignedIn));
    }
}
