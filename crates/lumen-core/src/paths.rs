//! File system paths for the client.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Manages file system paths for the client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for client files (~/.lumen)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.lumen`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".lumen"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.lumen).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.lumen/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the general key-value store path (~/.lumen/store.json).
    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join("store.json")
    }

    /// Ensure all directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/lumen-test"));
        assert_eq!(paths.base_dir(), &PathBuf::from("/tmp/lumen-test"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/lumen-test/config.json")
        );
        assert_eq!(
            paths.store_file(),
            PathBuf::from("/tmp/lumen-test/store.json")
        );
    }
}
