//! Authentication core for the lumen client.
//!
//! This crate provides:
//! - Session bootstrap: reconciling OAuth redirect fragments, deep links,
//!   and the persisted session into one authoritative session
//! - An auth state broadcaster with ordered observers and idempotent
//!   cancellation handles
//! - The auth operations (sign up, sign in, provider sign-in, sign out,
//!   password reset/update) over the hosted backend
//! - Platform adapters for the web, iOS, and Android surfaces

mod api;
mod broadcast;
mod client;
mod error;
mod platform;
mod redirect;
mod session;

pub use api::{ApiUser, AuthApi, SessionTokens, SignUpResponse, TokenResponse};
pub use broadcast::{AuthBroadcaster, AuthEvent, Subscription};
pub use client::{AuthClient, GoogleSignIn, SignUpOutcome};
pub use error::{AuthError, AuthResult};
pub use platform::{
    GoogleIdentity, GoogleProvider, NativePlatform, Platform, ReplaceUrlHook, WebPlatform,
};
pub use redirect::{without_fragment, RedirectArtifact, RedirectKind};
pub use session::{Session, User};
