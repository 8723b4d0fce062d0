//! Per-page-load detection state.
//!
//! One `DetectionSession` exists per page load. It is replaced wholesale on
//! navigation; nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use meet_recorder_protocol::{DetectionMethod, RecordingStatus};

use crate::detector::HostSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    DetectingJoin,
    DetectingHost,
    LocatingControl,
    Confirming,
    Started,
    Failed,
    /// Join or host detection gave up. A new start request may restart it.
    Abandoned,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::DetectingJoin => "detecting-join",
            Phase::DetectingHost => "detecting-host",
            Phase::LocatingControl => "locating-control",
            Phase::Confirming => "confirming",
            Phase::Started => "started",
            Phase::Failed => "failed",
            Phase::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Started | Phase::Failed | Phase::Abandoned)
    }

    /// Phases in which scheduled detection or activation work is outstanding.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Phase::DetectingJoin | Phase::DetectingHost | Phase::LocatingControl | Phase::Confirming
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSession {
    pub id: Ulid,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    has_joined: bool,
    is_host_inferred: bool,
    recording_started: bool,
    /// Failed activation attempts.
    pub retry_count: u32,
    pub join_polls: u32,
    pub host_polls: u32,
    pub detection_method: DetectionMethod,
    pub host_signal: Option<HostSignal>,
}

impl Default for DetectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSession {
    pub fn new() -> Self {
        Self {
            id: Ulid::new(),
            created_at: Utc::now(),
            phase: Phase::Idle,
            has_joined: false,
            is_host_inferred: false,
            recording_started: false,
            retry_count: 0,
            join_polls: 0,
            host_polls: 0,
            detection_method: DetectionMethod::default(),
            host_signal: None,
        }
    }

    pub fn has_joined(&self) -> bool {
        self.has_joined
    }

    pub fn is_host_inferred(&self) -> bool {
        self.is_host_inferred
    }

    pub fn recording_started(&self) -> bool {
        self.recording_started
    }

    /// Returns true only on the false-to-true edge.
    pub fn mark_joined(&mut self) -> bool {
        let changed = !self.has_joined;
        self.has_joined = true;
        changed
    }

    pub fn mark_host(&mut self, signal: HostSignal) -> bool {
        if self.is_host_inferred {
            return false;
        }
        self.is_host_inferred = true;
        self.host_signal = Some(signal);
        true
    }

    pub fn mark_recording_started(&mut self) -> bool {
        let changed = !self.recording_started;
        self.recording_started = true;
        changed
    }

    /// `hostJoined` in the status surface means the host was inferred.
    pub fn status(&self) -> RecordingStatus {
        RecordingStatus {
            recording: self.recording_started,
            host_joined: self.is_host_inferred,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_only_move_forward() {
        let mut session = DetectionSession::new();
        assert!(session.mark_joined());
        assert!(!session.mark_joined());
        assert!(session.mark_host(HostSignal::HostControls));
        assert!(!session.mark_host(HostSignal::LastResort));
        assert_eq!(session.host_signal, Some(HostSignal::HostControls));
        assert!(session.mark_recording_started());
        assert!(!session.mark_recording_started());
        assert!(session.has_joined() && session.is_host_inferred() && session.recording_started());
    }

    #[test]
    fn status_reflects_flags() {
        let mut session = DetectionSession::new();
        assert_eq!(
            session.status(),
            RecordingStatus {
                recording: false,
                host_joined: false
            }
        );
        session.mark_host(HostSignal::AdHocMeeting);
        session.mark_recording_started();
        assert_eq!(
            session.status(),
            RecordingStatus {
                recording: true,
                host_joined: true
            }
        );
    }

    #[test]
    fn sessions_get_distinct_ids() {
        assert_ne!(DetectionSession::new().id, DetectionSession::new().id);
    }

    #[test]
    fn terminal_phases() {
        assert!(Phase::Started.is_terminal());
        assert!(Phase::Abandoned.is_terminal());
        assert!(!Phase::Confirming.is_terminal());
        assert_eq!(Phase::LocatingControl.to_string(), "locating-control");
    }
}
