//! Derived status view for the settings UI.
//!
//! The UI shows three lines: whether the active tab is a meeting, whether
//! it is recording, and whether the user is authenticated.

use serde::Serialize;

use meet_recorder_protocol::{AuthStatus, RecordingStatus};

use crate::tabs::is_meeting_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingLabel {
    InMeeting,
    NotInMeeting,
}

impl MeetingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingLabel::InMeeting => "In Meeting",
            MeetingLabel::NotInMeeting => "Not in Meeting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingLabel {
    Active,
    Waiting,
    None,
}

impl RecordingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingLabel::Active => "Recording",
            RecordingLabel::Waiting => "Waiting for host...",
            RecordingLabel::None => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthLabel {
    Authenticated,
    NotAuthenticated,
}

impl AuthLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthLabel::Authenticated => "Authenticated",
            AuthLabel::NotAuthenticated => "Not Authenticated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub meeting: MeetingLabel,
    pub recording: RecordingLabel,
    pub auth: AuthLabel,
}

impl StatusSummary {
    /// `recording` is the active tab's answer to `getRecordingStatus`, or
    /// `None` when the tab did not answer.
    pub fn derive(active_url: Option<&str>, recording: Option<RecordingStatus>, auth: &AuthStatus) -> Self {
        let in_meeting = active_url.map(is_meeting_url).unwrap_or(false);
        let meeting = if in_meeting {
            MeetingLabel::InMeeting
        } else {
            MeetingLabel::NotInMeeting
        };
        let recording = match (in_meeting, recording) {
            (false, _) => RecordingLabel::None,
            (true, Some(status)) if status.recording => RecordingLabel::Active,
            (true, _) => RecordingLabel::Waiting,
        };
        let auth = if auth.authenticated {
            AuthLabel::Authenticated
        } else {
            AuthLabel::NotAuthenticated
        };
        Self {
            meeting,
            recording,
            auth,
        }
    }

    pub fn lines(&self) -> [(&'static str, &'static str); 3] {
        [
            ("Meeting", self.meeting.as_str()),
            ("Recording", self.recording.as_str()),
            ("Auth", self.auth.as_str()),
        ]
    }
}
