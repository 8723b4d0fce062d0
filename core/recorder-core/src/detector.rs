//! Join and host inference from page structure.
//!
//! Both checks are pure reads of the current document. Polling, retry
//! budgets and the last-resort fallback live in the orchestrator.

use serde::Serialize;
use url::Url;

use crate::dom::Document;
use crate::patterns::RE_MEETING_CODE_PATH;
use crate::query::catalog::{
    HOST_CONTROLS, IN_CALL_CONTROLS, JOIN_INDICATORS, PRE_JOIN_AFFORDANCE, RECORD_CONTROL,
    SCHEDULED_MEETING_MARKERS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinAssessment {
    /// No in-call indicator is rendered.
    NotJoined,
    /// In-call indicators exist but the join button is still showing.
    PreJoin,
    InCall,
}

/// Why the local user is believed to be the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSignal {
    /// The recording control is reachable without opening a menu.
    RecordingControl,
    HostControls,
    /// Instant meeting with visible meeting controls; the creator is assumed to host.
    AdHocMeeting,
    /// Host polling ran out but the user is clearly in the call.
    LastResort,
    /// The coordinator relayed a host participant event.
    External,
}

impl HostSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostSignal::RecordingControl => "recording_control",
            HostSignal::HostControls => "host_controls",
            HostSignal::AdHocMeeting => "ad_hoc_meeting",
            HostSignal::LastResort => "last_resort",
            HostSignal::External => "external",
        }
    }
}

pub fn assess_join(doc: &Document) -> JoinAssessment {
    if !JOIN_INDICATORS.is_present(doc) {
        return JoinAssessment::NotJoined;
    }
    let blocking = PRE_JOIN_AFFORDANCE
        .resolve_all(doc, doc.root())
        .into_iter()
        .any(|node| !doc.text_content(node).trim().is_empty());
    if blocking {
        JoinAssessment::PreJoin
    } else {
        JoinAssessment::InCall
    }
}

/// Tries the host signals strongest first.
pub fn infer_host(doc: &Document, url: &str) -> Option<HostSignal> {
    if RECORD_CONTROL.is_present(doc) {
        return Some(HostSignal::RecordingControl);
    }
    if HOST_CONTROLS.is_present(doc) {
        return Some(HostSignal::HostControls);
    }
    if is_ad_hoc_meeting(doc, url) && IN_CALL_CONTROLS.is_present(doc) {
        return Some(HostSignal::AdHocMeeting);
    }
    None
}

/// A bare meeting-code URL with no calendar metadata on the page.
pub fn is_ad_hoc_meeting(doc: &Document, url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    RE_MEETING_CODE_PATH.is_match(parsed.path()) && !SCHEDULED_MEETING_MARKERS.is_present(doc)
}

/// The leave control is on screen.
pub fn clearly_in_meeting(doc: &Document) -> bool {
    IN_CALL_CONTROLS.is_present(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, ViewportInfo};

    const AD_HOC: &str = "https://meet.google.com/abc-defg-hij";
    const LOOKUP: &str = "https://meet.google.com/lookup/team-sync";

    fn doc(body: Vec<ElementSpec>) -> Document {
        Document::from_specs(ViewportInfo::default(), &body)
    }

    #[test]
    fn nothing_rendered_is_not_joined() {
        assert_eq!(assess_join(&doc(vec![])), JoinAssessment::NotJoined);
    }

    #[test]
    fn join_button_with_text_is_pre_join() {
        let d = doc(vec![
            ElementSpec::button("Turn off microphone"),
            ElementSpec::new("button")
                .attr("jsname", "Qx7uuf")
                .child(ElementSpec::new("span").text("Join now")),
        ]);
        assert_eq!(assess_join(&d), JoinAssessment::PreJoin);
    }

    #[test]
    fn empty_join_button_is_ignored() {
        let d = doc(vec![
            ElementSpec::button("Leave call"),
            ElementSpec::new("button").attr("jsname", "Qx7uuf"),
        ]);
        assert_eq!(assess_join(&d), JoinAssessment::InCall);
    }

    #[test]
    fn any_single_indicator_suffices() {
        for spec in [
            ElementSpec::new("div").attr("data-self-name", "You"),
            ElementSpec::new("div").attr("jsname", "BOHaEe"),
            ElementSpec::new("div").attr("aria-label", "Turn off CAMERA"),
            ElementSpec::new("div").attr("data-participant-id", "p1"),
        ] {
            assert_eq!(assess_join(&doc(vec![spec])), JoinAssessment::InCall);
        }
    }

    #[test]
    fn host_signals_in_priority_order() {
        let both = doc(vec![
            ElementSpec::button("Leave call"),
            ElementSpec::button("Host controls"),
            ElementSpec::button("Start recording"),
        ]);
        assert_eq!(infer_host(&both, LOOKUP), Some(HostSignal::RecordingControl));

        let host = doc(vec![ElementSpec::button("Leave call"), ElementSpec::button("Host controls")]);
        assert_eq!(infer_host(&host, LOOKUP), Some(HostSignal::HostControls));

        let plain = doc(vec![ElementSpec::button("Leave call")]);
        assert_eq!(infer_host(&plain, AD_HOC), Some(HostSignal::AdHocMeeting));
        assert_eq!(infer_host(&plain, LOOKUP), None);
    }

    #[test]
    fn calendar_marker_rules_out_ad_hoc() {
        let scheduled = doc(vec![
            ElementSpec::button("Leave call"),
            ElementSpec::new("div").attr("data-calendar-event-id", "evt"),
        ]);
        assert!(!is_ad_hoc_meeting(&scheduled, AD_HOC));
        assert!(clearly_in_meeting(&scheduled));
    }

    #[test]
    fn stop_recording_is_not_a_host_signal() {
        let d = doc(vec![ElementSpec::button("Stop recording")]);
        assert_eq!(infer_host(&d, LOOKUP), None);
    }
}
