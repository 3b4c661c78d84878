//! Core types, configuration, and utilities for the lumen client.

mod config;
mod error;
mod logging;
mod paths;
mod platform;

pub use config::{Config, DEFAULT_API_URL, DEFAULT_PUBLISHABLE_KEY};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
pub use platform::PlatformKind;
