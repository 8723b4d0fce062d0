//! Error types for meet-recorder-core operations.

use std::path::PathBuf;

use crate::dom::NodeId;

/// Classification of a failed detection or activation step.
///
/// Everything except `RetryExhausted` is recovered through the scheduler;
/// `ConfigurationDisabled` is not an error at all and only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TransientNotFound,
    InteractionFailure,
    RetryExhausted,
    ConfigurationDisabled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::TransientNotFound => "transient_not_found",
            FailureKind::InteractionFailure => "interaction_failure",
            FailureKind::RetryExhausted => "retry_exhausted",
            FailureKind::ConfigurationDisabled => "configuration_disabled",
        }
    }
}

/// All errors that can occur in meet-recorder-core operations.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    // ─────────────────────────────────────────────────────────────────────
    // Page Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Node {0:?} is no longer attached to the document")]
    StaleNode(NodeId),

    #[error("Interaction failed on {target}: {details}")]
    InteractionFailed { target: String, details: String },

    #[error("Page is no longer live")]
    PageGone,

    #[error("Retries exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fixture invalid: {0}")]
    InvalidFixture(String),
}

impl RecorderError {
    /// Maps a page-level error onto the retry taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RecorderError::StaleNode(_) => FailureKind::TransientNotFound,
            RecorderError::RetryExhausted { .. } => FailureKind::RetryExhausted,
            _ => FailureKind::InteractionFailure,
        }
    }
}

/// Convenience type alias for Results using RecorderError.
pub type Result<T> = std::result::Result<T, RecorderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_errors_map_to_taxonomy() {
        assert_eq!(
            RecorderError::StaleNode(crate::dom::Document::default().root()).failure_kind(),
            FailureKind::TransientNotFound
        );
        assert_eq!(
            RecorderError::InteractionFailed {
                target: "start".into(),
                details: "detached".into()
            }
            .failure_kind(),
            FailureKind::InteractionFailure
        );
        assert_eq!(
            RecorderError::RetryExhausted { attempts: 10 }.failure_kind(),
            FailureKind::RetryExhausted
        );
    }
}
