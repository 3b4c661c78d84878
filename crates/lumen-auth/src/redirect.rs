//! Redirect artifact extraction.
//!
//! OAuth providers and email links hand tokens back to the client inside
//! a URL: fragment parameters on the web, deep-link query parameters on
//! native. An artifact lives for exactly one reconciliation pass: the
//! caller installs the session it describes and discards it (and, on the
//! web, scrubs the fragment from the visible address so a refresh does
//! not reprocess stale tokens).

use std::collections::HashMap;
use url::Url;

/// What kind of redirect produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Redirect-OAuth callback landing on the web origin
    OAuthCallback,
    /// Email-verification deep link
    VerifyEmail,
    /// Password-recovery deep link
    ResetPassword,
}

/// Transient token data extracted from a redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectArtifact {
    /// Bearer access token
    pub access_token: String,
    /// Refresh token, when the redirect carried one
    pub refresh_token: Option<String>,
    /// The operation this redirect completes
    pub kind: RedirectKind,
}

impl RedirectArtifact {
    /// Extract an artifact from a web address fragment.
    ///
    /// Returns `None` when the fragment holds no usable tokens. An
    /// `error` parameter without an access token is explicitly not an
    /// artifact; the caller falls through to standard session retrieval.
    pub fn from_web_fragment(url: &Url) -> Option<Self> {
        let fragment = url.fragment()?;
        let params = parse_params(fragment);

        let access_token = match params.get("access_token") {
            Some(token) if !token.is_empty() => token.clone(),
            _ => {
                if let Some(error) = params.get("error") {
                    tracing::debug!(error = %error, "Redirect returned an error; no session to install");
                }
                return None;
            }
        };

        Some(Self {
            access_token,
            refresh_token: params.get("refresh_token").cloned(),
            kind: RedirectKind::OAuthCallback,
        })
    }

    /// Extract an artifact from a native deep link.
    ///
    /// Only `verify-email` and `reset-password` paths are recognized, and
    /// both an `access_token` and a `type` query parameter must be
    /// present. Anything else is "no actionable artifact", never an error.
    pub fn from_deep_link(url: &Url) -> Option<Self> {
        let kind = deep_link_kind(url)?;
        let query = url.query()?;
        let params = parse_params(query);

        let access_token = params.get("access_token")?.clone();
        if access_token.is_empty() || !params.contains_key("type") {
            return None;
        }

        Some(Self {
            access_token,
            refresh_token: params.get("refresh_token").cloned(),
            kind,
        })
    }
}

/// Classify a deep link by its path.
fn deep_link_kind(url: &Url) -> Option<RedirectKind> {
    // Scheme URLs ("lumen://verify-email") put the marker in the host
    // position; universal links put it in the path.
    let host = url.host_str().unwrap_or_default();
    let path = url.path();

    if host == "verify-email" || path.contains("verify-email") {
        Some(RedirectKind::VerifyEmail)
    } else if host == "reset-password" || path.contains("reset-password") {
        Some(RedirectKind::ResetPassword)
    } else {
        None
    }
}

/// Decode `key=value&...` pairs.
fn parse_params(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Copy of a URL with the fragment removed, for address scrubbing.
pub fn without_fragment(url: &Url) -> Url {
    let mut scrubbed = url.clone();
    scrubbed.set_fragment(None);
    scrubbed
}
