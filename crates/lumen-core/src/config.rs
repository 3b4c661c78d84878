//! Configuration management for the client.

use crate::{CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default backend API URL (can be overridden at compile time via LUMEN_API_URL env var).
pub const DEFAULT_API_URL: &str = match option_env!("LUMEN_API_URL") {
    Some(url) => url,
    None => "https://project.supabase.co",
};

/// Default publishable API key (can be overridden at compile time via LUMEN_PUBLISHABLE_KEY env var).
pub const DEFAULT_PUBLISHABLE_KEY: &str = match option_env!("LUMEN_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "publishable-key",
};

/// Default log level.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default in-app URL scheme used for native email callbacks.
const DEFAULT_APP_SCHEME: &str = "lumen";

/// Default web origin used for browser email callbacks.
const DEFAULT_WEB_ORIGIN: &str = "https://app.lumen.app";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Backend project URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Publishable API key (public, safe to expose).
    #[serde(default = "default_publishable_key")]
    pub publishable_key: String,
    /// In-app URL scheme for native deep-link callbacks.
    #[serde(default = "default_app_scheme")]
    pub app_scheme: String,
    /// Web origin for browser redirect callbacks.
    #[serde(default = "default_web_origin")]
    pub web_origin: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_publishable_key() -> String {
    DEFAULT_PUBLISHABLE_KEY.to_string()
}

fn default_app_scheme() -> String {
    DEFAULT_APP_SCHEME.to_string()
}

fn default_web_origin() -> String {
    DEFAULT_WEB_ORIGIN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            publishable_key: DEFAULT_PUBLISHABLE_KEY.to_string(),
            app_scheme: DEFAULT_APP_SCHEME.to_string(),
            web_origin: DEFAULT_WEB_ORIGIN.to_string(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, falling back to defaults.
    /// Note: api_url and publishable_key are compile-time only and always
    /// use the built-in defaults, regardless of what's in the config file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        // Force compile-time values (never from config file)
        config.api_url = DEFAULT_API_URL.to_string();
        config.publishable_key = DEFAULT_PUBLISHABLE_KEY.to_string();

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    /// api_url and publishable_key are compile-time only; the rest can be
    /// overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("LUMEN_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(scheme) = std::env::var("LUMEN_APP_SCHEME") {
            self.app_scheme = scheme;
        }
        if let Ok(origin) = std::env::var("LUMEN_WEB_ORIGIN") {
            self.web_origin = origin;
        }
    }
}
