//! Platform adapters.
//!
//! The surface (web, iOS, Android) is chosen once when the client is
//! constructed; everything platform-specific (email callback URLs, the
//! native Google handshake, address scrubbing) goes through the
//! [`Platform`] trait instead of runtime probing.

use crate::error::{AuthError, AuthResult};
use lumen_core::PlatformKind;
use url::Url;

/// Result of a native Google handshake.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    /// Identity token to exchange with the backend. The handshake can
    /// complete without one (e.g., consent revoked mid-flow); callers
    /// must treat that as a failure.
    pub id_token: Option<String>,
    /// Email reported by the provider UI
    pub email: Option<String>,
}

/// Native Google sign-in SDK surface.
///
/// Implemented by the embedding shell over the platform SDK. The client
/// core only drives it; a platform without an implementation yields
/// [`AuthError::ProviderUnavailable`] instead of crashing.
pub trait GoogleProvider: Send + Sync {
    /// Present the native sign-in UI and run the handshake.
    fn sign_in(&self) -> AuthResult<GoogleIdentity>;

    /// Clear the provider-side session.
    fn sign_out(&self) -> AuthResult<()>;

    /// The SDK's own "previously signed in" flag.
    fn has_previous_sign_in(&self) -> bool;
}

/// Platform adapter contract.
pub trait Platform: Send + Sync {
    /// Which surface this adapter represents.
    fn kind(&self) -> PlatformKind;

    /// Callback URL for verification and recovery emails: the in-app
    /// scheme on native, the current origin on web.
    fn email_redirect_url(&self) -> String;

    /// Native Google provider hook, when the shell wired one up.
    fn google(&self) -> Option<&dyn GoogleProvider> {
        None
    }

    /// Replace the visible address after a redirect artifact has been
    /// consumed, without reloading. Meaningful on web only.
    fn replace_visible_url(&self, _url: &Url) {}
}

/// Hook the web shell registers to rewrite the address bar.
pub type ReplaceUrlHook = Box<dyn Fn(&Url) + Send + Sync>;

/// Browser surface.
pub struct WebPlatform {
    origin: String,
    replace_url: Option<ReplaceUrlHook>,
}

impl WebPlatform {
    /// Create a web adapter for the given origin.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            replace_url: None,
        }
    }

    /// Register the address-rewrite hook (history.replaceState on the
    /// shell side).
    pub fn with_replace_url_hook(mut self, hook: ReplaceUrlHook) -> Self {
        self.replace_url = Some(hook);
        self
    }
}

impl Platform for WebPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Web
    }

    fn email_redirect_url(&self) -> String {
        self.origin.clone()
    }

    fn replace_visible_url(&self, url: &Url) {
        if let Some(hook) = &self.replace_url {
            hook(url);
        }
    }
}

/// Native mobile surface (iOS or Android).
pub struct NativePlatform {
    kind: PlatformKind,
    scheme: String,
    google: Option<Box<dyn GoogleProvider>>,
}

impl NativePlatform {
    /// Create the iOS adapter with the app's deep-link scheme.
    pub fn ios(scheme: impl Into<String>) -> Self {
        Self {
            kind: PlatformKind::NativeIos,
            scheme: scheme.into(),
            google: None,
        }
    }

    /// Create the Android adapter with the app's deep-link scheme.
    pub fn android(scheme: impl Into<String>) -> Self {
        Self {
            kind: PlatformKind::NativeAndroid,
            scheme: scheme.into(),
            google: None,
        }
    }

    /// Wire up the native Google SDK.
    pub fn with_google_provider(mut self, provider: Box<dyn GoogleProvider>) -> Self {
        self.google = Some(provider);
        self
    }
}

impl Platform for NativePlatform {
    fn kind(&self) -> PlatformKind {
        self.kind
    }

    fn email_redirect_url(&self) -> String {
        format!("{}://auth/callback", self.scheme)
    }

    fn google(&self) -> Option<&dyn GoogleProvider> {
        self.google.as_deref()
    }
}

/// Fetch the provider hook, or fail without crashing when the SDK is absent.
pub(crate) fn require_google(platform: &dyn Platform) -> AuthResult<&dyn GoogleProvider> {
    platform.google().ok_or_else(|| {
        AuthError::ProviderUnavailable(format!(
            "Google sign-in SDK is not available on {}",
            platform.kind()
        ))
    })
}
