//! Persisted feature flag.
//!
//! The only state that survives a page reload is `extensionEnabled`. The
//! coordinator's settings surface writes it; the detector reads it before
//! every detection or activation step and does nothing while it is off.
//!
//! # File Format
//!
//! ```json
//! { "extensionEnabled": true }
//! ```
//!
//! A missing file, a missing key or a corrupt file all read as enabled.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RecorderError, Result};

pub trait SettingsStore: Send + Sync {
    fn extension_enabled(&self) -> bool;
    fn set_extension_enabled(&self, enabled: bool) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default = "default_enabled")]
    extension_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Reads the flag from disk on every call so a toggle takes effect mid-session.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Option<SettingsFile> {
        let content = match fs_err::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(error = %err, "Failed to read settings; treating extension as enabled");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "Corrupt settings file ignored");
                None
            }
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn extension_enabled(&self) -> bool {
        self.load()
            .map(|settings| settings.extension_enabled)
            .unwrap_or(true)
    }

    fn set_extension_enabled(&self, enabled: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent).map_err(|source| RecorderError::Io {
                context: "creating settings dir".to_string(),
                source,
            })?;
        }

        let payload = serde_json::to_vec_pretty(&SettingsFile {
            extension_enabled: enabled,
        })
        .map_err(|source| RecorderError::Json {
            context: "serializing settings".to_string(),
            source,
        })?;
        let tmp_path = self.path.with_extension("tmp");
        fs_err::write(&tmp_path, payload).map_err(|source| RecorderError::Io {
            context: "writing settings".to_string(),
            source,
        })?;
        fs_err::rename(&tmp_path, &self.path).map_err(|source| RecorderError::Io {
            context: "committing settings".to_string(),
            source,
        })
    }
}

#[derive(Debug)]
pub struct MemorySettingsStore {
    enabled: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn extension_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_extension_enabled(&self, enabled: bool) -> Result<()> {
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_enabled() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        assert!(store.extension_enabled());
    }

    #[test]
    fn toggle_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileSettingsStore::new(path.clone());

        store.set_extension_enabled(false).unwrap();
        assert!(!store.extension_enabled());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"extensionEnabled\": false"));

        store.set_extension_enabled(true).unwrap();
        assert!(store.extension_enabled());
    }

    #[test]
    fn corrupt_file_reads_enabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(FileSettingsStore::new(path).extension_enabled());
    }

    #[test]
    fn missing_key_reads_enabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(FileSettingsStore::new(path).extension_enabled());
    }

    #[test]
    fn memory_store_toggles() {
        let store = MemorySettingsStore::default();
        assert!(store.extension_enabled());
        store.set_extension_enabled(false).unwrap();
        assert!(!store.extension_enabled());
    }
}
