//! Timing and behavior knobs for detection and activation.
//!
//! Loaded from `recorder.toml`. Every field has a default, so a missing file
//! or a partial file is fine. The delays are correctness-relevant: each one
//! gives the page time to finish rendering the previous step's DOM change
//! before the next read.
//!
//! The built-in defaults, written out:
//!
//! ```toml
//! max_retries = 10
//!
//! [detection]
//! poll_interval_ms = 2000
//!
//! [activation]
//! backoff_base_ms = 2000
//! backoff_cap_ms = 30000
//!
//! [confirmation]
//! include_captions = true
//! start_transcript = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RecorderError, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 2_000;
pub const DEFAULT_BACKOFF_CAP_MS: u64 = 30_000;
pub const DEFAULT_MENU_OPEN_DELAY_MS: u64 = 500;
pub const DEFAULT_MENU_SEARCH_ATTEMPTS: u32 = 5;
pub const DEFAULT_MENU_SEARCH_INTERVAL_MS: u64 = 500;
pub const DEFAULT_PANEL_INITIAL_DELAY_MS: u64 = 2_000;
pub const DEFAULT_PANEL_RECHECK_DELAY_MS: u64 = 3_000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_LABEL_ANCESTOR_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Upper bound shared by join polling, host polling and activation attempts.
    pub max_retries: u32,
    pub detection: DetectionConfig,
    pub activation: ActivationConfig,
    pub confirmation: ConfirmationConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            detection: DetectionConfig::default(),
            activation: ActivationConfig::default(),
            confirmation: ConfirmationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Fixed interval between join/host polls. No backoff at this stage.
    pub poll_interval_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    /// Wait after opening a menu or tools panel before the first search.
    pub menu_open_delay_ms: u64,
    pub menu_search_attempts: u32,
    pub menu_search_interval_ms: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
            menu_open_delay_ms: DEFAULT_MENU_OPEN_DELAY_MS,
            menu_search_attempts: DEFAULT_MENU_SEARCH_ATTEMPTS,
            menu_search_interval_ms: DEFAULT_MENU_SEARCH_INTERVAL_MS,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// The recording panel populates slowly; first readiness check waits this long.
    pub panel_initial_delay_ms: u64,
    /// Extra wait before the single readiness recheck.
    pub panel_recheck_delay_ms: u64,
    /// Wait after toggling options before looking for the consent dialog.
    pub settle_delay_ms: u64,
    pub include_captions: bool,
    pub start_transcript: bool,
    /// How many ancestors the checkbox label search climbs.
    pub label_ancestor_depth: usize,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            panel_initial_delay_ms: DEFAULT_PANEL_INITIAL_DELAY_MS,
            panel_recheck_delay_ms: DEFAULT_PANEL_RECHECK_DELAY_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            include_captions: true,
            start_transcript: true,
            label_ancestor_depth: DEFAULT_LABEL_ANCESTOR_DEPTH,
        }
    }
}


/// Loads the config file, returning defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<RecorderConfig> {
    if !path.exists() {
        return Ok(RecorderConfig::default());
    }

    let content = fs_err::read_to_string(path).map_err(|source| RecorderError::Io {
        context: format!("reading config {}", path.display()),
        source,
    })?;
    parse_config(&content).map_err(|details| RecorderError::ConfigMalformed {
        path: path.to_path_buf(),
        details,
    })
}

pub fn parse_config(content: &str) -> std::result::Result<RecorderConfig, String> {
    let config = toml::from_str::<RecorderConfig>(content).map_err(|err| err.to_string())?;
    if config.max_retries == 0 {
        return Err("max_retries must be at least 1".to_string());
    }
    if config.activation.menu_search_attempts == 0 {
        return Err("activation.menu_search_attempts must be at least 1".to_string());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(&dir.path().join("missing.toml")).expect("load config");
        assert_eq!(config, RecorderConfig::default());
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.detection.poll_interval_ms, 2_000);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("recorder.toml");
        fs_err::write(
            &path,
            r#"
max_retries = 4

[activation]
backoff_cap_ms = 10000

[confirmation]
start_transcript = false
"#,
        )
        .expect("write config");

        let config = load_config(&path).expect("load config");
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.activation.backoff_cap_ms, 10_000);
        assert_eq!(config.activation.backoff_base_ms, DEFAULT_BACKOFF_BASE_MS);
        assert!(config.confirmation.include_captions);
        assert!(!config.confirmation.start_transcript);
    }

    #[test]
    fn module_doc_example_is_the_defaults() {
        let written = r#"
max_retries = 10

[detection]
poll_interval_ms = 2000

[activation]
backoff_base_ms = 2000
backoff_cap_ms = 30000

[confirmation]
include_captions = true
start_transcript = true
"#;
        let parsed: RecorderConfig = toml::from_str(written).expect("parse config");
        assert_eq!(parsed, RecorderConfig::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("recorder.toml");
        fs_err::write(&path, "max_retries = \"lots\"").expect("write config");

        match load_config(&path) {
            Err(RecorderError::ConfigMalformed { path: reported, .. }) => {
                assert_eq!(reported, path)
            }
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }
    }

    #[test]
    fn zero_retries_rejected() {
        assert!(parse_config("max_retries = 0").is_err());
    }
}
