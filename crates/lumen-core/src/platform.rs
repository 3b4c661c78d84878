//! Platform identity for the client.
//!
//! The platform is selected once at construction time (by the embedding
//! shell) instead of being probed at runtime. Everything downstream,
//! from credential routing to provider sign-in, branches on this
//! value or on the adapter built from it.

use serde::{Deserialize, Serialize};

/// The surface the client is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformKind {
    /// Browser surface.
    Web,
    /// Native iOS surface.
    NativeIos,
    /// Native Android surface.
    NativeAndroid,
}

impl PlatformKind {
    /// Returns true for the native mobile surfaces.
    pub fn is_native(&self) -> bool {
        matches!(self, PlatformKind::NativeIos | PlatformKind::NativeAndroid)
    }

    /// Stable string form, used in logs and cached metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::Web => "web",
            PlatformKind::NativeIos => "ios",
            PlatformKind::NativeAndroid => "android",
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
