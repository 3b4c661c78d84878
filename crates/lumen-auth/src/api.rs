//! REST client for the hosted auth backend.
//!
//! Thin wrapper over the backend's `/auth/v1/` endpoints. Every call
//! returns a structured [`AuthError`] on rejection; nothing here panics
//! or retries. The backend is the sole source of truth for session
//! validity; this client never inspects token contents.

use crate::error::{AuthError, AuthResult};
use crate::session::User;
use serde::Deserialize;
use tracing::{debug, warn};

/// Backend auth API client.
#[derive(Clone)]
pub struct AuthApi {
    http_client: reqwest::Client,
    api_url: String,
    publishable_key: String,
}

/// User record as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    /// User UUID
    pub id: String,
    /// Email, when known
    #[serde(default)]
    pub email: Option<String>,
    /// Provider-supplied profile metadata
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
    /// Backend-managed metadata (provider, ...)
    #[serde(default)]
    pub app_metadata: Option<serde_json::Value>,
}

impl From<ApiUser> for User {
    fn from(api: ApiUser) -> Self {
        let meta = api.user_metadata.as_ref();
        let display_name = meta
            .and_then(|m| m.get("full_name").or_else(|| m.get("name")))
            .and_then(|v| v.as_str())
            .map(String::from);
        let avatar_url = meta
            .and_then(|m| m.get("avatar_url"))
            .and_then(|v| v.as_str())
            .map(String::from);
        let provider = api
            .app_metadata
            .as_ref()
            .and_then(|m| m.get("provider"))
            .and_then(|v| v.as_str())
            .map(String::from);

        User {
            id: api.id,
            email: api.email,
            display_name,
            avatar_url,
            provider,
        }
    }
}

/// Token grant response (password, refresh and id-token grants).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// The authenticated user
    pub user: ApiUser,
}

/// Sign-up response: the created user, plus session tokens when the
/// backend signed the user in immediately. Absent tokens mean email
/// confirmation is still pending.
#[derive(Debug, Clone)]
pub struct SignUpResponse {
    /// The created (possibly unconfirmed) user
    pub user: ApiUser,
    /// Session tokens, when no confirmation step is required
    pub tokens: Option<SessionTokens>,
}

/// Bare token pair from a grant that signed the user in.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokens {
    /// Bearer access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl AuthApi {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `api_url` - The backend project URL (e.g., `https://xyz.supabase.co`)
    /// * `publishable_key` - The public API key sent with every request
    pub fn new(api_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into(),
            publishable_key: publishable_key.into(),
        }
    }

    /// Build the URL for an auth endpoint.
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, path)
    }

    /// Extract a readable message from an error response body.
    async fn response_error(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("msg")
                    .or_else(|| v.get("error_description"))
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);
        format!("HTTP {}: {}", status, message)
    }

    /// Create a new account.
    ///
    /// The verification email links back to `redirect_to`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> AuthResult<SignUpResponse> {
        let url = self.auth_url("signup");

        debug!(url = %url, email = %email, "Requesting account creation");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(error = %message, "Sign-up failed");
            return Err(AuthError::Backend(message));
        }

        let body: serde_json::Value = response.json().await?;
        parse_sign_up_body(body)
    }

    /// Exchange email/password credentials for a session.
    pub async fn token_password(&self, email: &str, password: &str) -> AuthResult<TokenResponse> {
        let url = self.auth_url("token?grant_type=password");

        debug!(email = %email, "Attempting email/password sign-in");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(error = %message, "Sign-in failed");
            return Err(AuthError::InvalidCredentials(message));
        }

        Ok(response.json().await?)
    }

    /// Exchange a refresh token for a fresh session.
    pub async fn token_refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let url = self.auth_url("token?grant_type=refresh_token");

        debug!("Refreshing session tokens");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "refresh_token": refresh_token,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(error = %message, "Token refresh failed");
            return Err(AuthError::TokenRefresh(message));
        }

        Ok(response.json().await?)
    }

    /// Exchange a provider identity token for a session.
    pub async fn token_id_token(&self, provider: &str, id_token: &str) -> AuthResult<TokenResponse> {
        let url = self.auth_url("token?grant_type=id_token");

        debug!(provider = %provider, "Exchanging identity token");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "provider": provider,
                "id_token": id_token,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(provider = %provider, error = %message, "Identity token exchange failed");
            return Err(AuthError::OAuth(message));
        }

        Ok(response.json().await?)
    }

    /// Fetch the user behind an access token.
    ///
    /// Also serves as server-side validation of the token: a rejected
    /// token means no session.
    pub async fn get_user(&self, access_token: &str) -> AuthResult<ApiUser> {
        let url = self.auth_url("user");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(error = %message, "User lookup failed");
            return Err(AuthError::Backend(message));
        }

        Ok(response.json().await?)
    }

    /// Update the signed-in user's password.
    pub async fn update_user_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> AuthResult<ApiUser> {
        let url = self.auth_url("user");

        let response = self
            .http_client
            .put(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "password": new_password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(error = %message, "Password update failed");
            return Err(AuthError::Backend(message));
        }

        Ok(response.json().await?)
    }

    /// Invalidate the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let url = self.auth_url("logout");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(error = %message, "Backend sign-out failed");
            return Err(AuthError::Backend(message));
        }

        Ok(())
    }

    /// Send a password-reset email linking back to `redirect_to`.
    pub async fn recover(&self, email: &str, redirect_to: &str) -> AuthResult<()> {
        let url = self.auth_url("recover");

        debug!(email = %email, "Requesting password reset email");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({
                "email": email,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::response_error(response).await;
            warn!(error = %message, "Password reset request failed");
            return Err(AuthError::Backend(message));
        }

        Ok(())
    }

    /// Build the redirect-OAuth entry URL for a provider.
    ///
    /// The browser navigates here; the provider eventually redirects back
    /// to `redirect_to` with tokens in the address fragment.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, force_consent: bool) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("provider", provider);
        query.append_pair("redirect_to", redirect_to);
        if force_consent {
            query.append_pair("prompt", "consent");
        }
        format!("{}?{}", self.auth_url("authorize"), query.finish())
    }
}

/// Split a sign-up response into user + optional tokens.
///
/// The backend returns a token grant when the account is usable
/// immediately, and a bare user object when email confirmation is
/// pending.
fn parse_sign_up_body(body: serde_json::Value) -> AuthResult<SignUpResponse> {
    if body.get("access_token").is_some() {
        let tokens: SessionTokens = serde_json::from_value(body.clone())?;
        let user: ApiUser = serde_json::from_value(
            body.get("user")
                .cloned()
                .ok_or_else(|| AuthError::Backend("token grant without user".to_string()))?,
        )?;
        Ok(SignUpResponse {
            user,
            tokens: Some(tokens),
        })
    } else {
        let user: ApiUser = serde_json::from_value(body)?;
        Ok(SignUpResponse { user, tokens: None })
    }
}
