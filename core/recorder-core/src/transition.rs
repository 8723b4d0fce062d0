//! Maps orchestrator events to phase transitions.
//! Events that make no sense in the current phase leave it unchanged.

use serde::Serialize;

use crate::session::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    DetectionRequested,
    JoinConfirmed,
    HostInferred,
    /// External host signal; skips straight to activation.
    ActivationForced,
    PanelOpened,
    /// Out-of-band or in-flow confirmation that recording is running.
    RecordingConfirmed,
    AttemptFailed,
    RetriesExhausted,
    DetectionAbandoned,
    /// The feature flag was off when scheduled work came due.
    DetectionSuspended,
}

pub fn next_phase(current: Phase, event: PhaseEvent) -> Phase {
    use Phase::*;

    match (current, event) {
        (Started, _) => Started,
        (_, PhaseEvent::RecordingConfirmed) => Started,

        (Idle | Abandoned, PhaseEvent::DetectionRequested) => DetectingJoin,
        (DetectingJoin, PhaseEvent::JoinConfirmed) => DetectingHost,
        (DetectingHost, PhaseEvent::HostInferred) => LocatingControl,
        (Idle | DetectingJoin | DetectingHost | Abandoned, PhaseEvent::ActivationForced) => {
            LocatingControl
        }
        (DetectingJoin | DetectingHost, PhaseEvent::DetectionAbandoned) => Abandoned,
        (DetectingJoin | DetectingHost | LocatingControl | Confirming, PhaseEvent::DetectionSuspended) => {
            Idle
        }

        (LocatingControl, PhaseEvent::PanelOpened) => Confirming,
        (LocatingControl | Confirming, PhaseEvent::AttemptFailed) => LocatingControl,
        (LocatingControl | Confirming, PhaseEvent::RetriesExhausted) => Failed,

        (phase, _) => phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut phase = Phase::Idle;
        for event in [
            PhaseEvent::DetectionRequested,
            PhaseEvent::JoinConfirmed,
            PhaseEvent::HostInferred,
            PhaseEvent::PanelOpened,
            PhaseEvent::RecordingConfirmed,
        ] {
            phase = next_phase(phase, event);
        }
        assert_eq!(phase, Phase::Started);
    }

    #[test]
    fn test_started_is_absorbing() {
        for event in [
            PhaseEvent::DetectionRequested,
            PhaseEvent::AttemptFailed,
            PhaseEvent::RetriesExhausted,
            PhaseEvent::DetectionAbandoned,
            PhaseEvent::ActivationForced,
        ] {
            assert_eq!(next_phase(Phase::Started, event), Phase::Started);
        }
    }

    #[test]
    fn test_confirmation_wins_from_any_phase() {
        for phase in [
            Phase::Idle,
            Phase::DetectingJoin,
            Phase::LocatingControl,
            Phase::Failed,
            Phase::Abandoned,
        ] {
            assert_eq!(next_phase(phase, PhaseEvent::RecordingConfirmed), Phase::Started);
        }
    }

    #[test]
    fn test_failed_attempt_returns_to_locating() {
        assert_eq!(
            next_phase(Phase::Confirming, PhaseEvent::AttemptFailed),
            Phase::LocatingControl
        );
        assert_eq!(
            next_phase(Phase::LocatingControl, PhaseEvent::RetriesExhausted),
            Phase::Failed
        );
    }

    #[test]
    fn test_failed_does_not_restart() {
        assert_eq!(
            next_phase(Phase::Failed, PhaseEvent::DetectionRequested),
            Phase::Failed
        );
        assert_eq!(
            next_phase(Phase::Failed, PhaseEvent::ActivationForced),
            Phase::Failed
        );
    }

    #[test]
    fn test_abandoned_can_restart() {
        assert_eq!(
            next_phase(Phase::Abandoned, PhaseEvent::DetectionRequested),
            Phase::DetectingJoin
        );
        assert_eq!(
            next_phase(Phase::Abandoned, PhaseEvent::ActivationForced),
            Phase::LocatingControl
        );
    }

    #[test]
    fn test_suspension_returns_to_idle() {
        assert_eq!(
            next_phase(Phase::Confirming, PhaseEvent::DetectionSuspended),
            Phase::Idle
        );
        assert_eq!(
            next_phase(Phase::Failed, PhaseEvent::DetectionSuspended),
            Phase::Failed
        );
    }

    #[test]
    fn test_duplicate_start_is_ignored_mid_detection() {
        assert_eq!(
            next_phase(Phase::DetectingHost, PhaseEvent::DetectionRequested),
            Phase::DetectingHost
        );
    }

    #[test]
    fn test_out_of_order_events_are_ignored() {
        assert_eq!(
            next_phase(Phase::Idle, PhaseEvent::PanelOpened),
            Phase::Idle
        );
        assert_eq!(
            next_phase(Phase::DetectingJoin, PhaseEvent::HostInferred),
            Phase::DetectingJoin
        );
    }
}
