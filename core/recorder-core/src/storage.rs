//! Storage configuration and path management for the recorder.
//!
//! All file locations live under one root so tests can inject a temp dir
//! with `StorageConfig::with_root()`.

use std::path::{Path, PathBuf};

use crate::error::{RecorderError, Result};

const ROOT_DIR_NAME: &str = ".meet-recorder";

/// Central configuration for all recorder storage paths.
///
/// Production code uses `StorageConfig::from_home()` which points to
/// `~/.meet-recorder/`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(RecorderError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(ROOT_DIR_NAME),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to settings.json (the persisted feature flag).
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Path to recorder.toml (timing and behavior knobs).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("recorder.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_root() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/rec"));
        assert_eq!(
            storage.settings_file(),
            PathBuf::from("/tmp/rec/settings.json")
        );
        assert_eq!(
            storage.config_file(),
            PathBuf::from("/tmp/rec/recorder.toml")
        );
        assert_eq!(storage.logs_dir(), PathBuf::from("/tmp/rec/logs"));
    }
}
