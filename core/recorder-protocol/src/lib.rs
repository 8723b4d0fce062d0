//! Message types and validation for the meet recorder.
//!
//! This crate is shared by the in-page detector, the coordinator and the
//! status UI so the `action`-tagged JSON shapes cannot drift between them.
//! Receivers remain the authority on validation, but senders reuse the same
//! types to construct valid messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Role values the conferencing platform uses for the meeting owner.
pub const HOST_ROLES: [&str; 2] = ["ORGANIZER", "HOST"];

/// Message type an external integration sends when a participant joins.
pub const EXTERNAL_PARTICIPANT_JOINED: &str = "meet.participant.joined";

const DETECTOR_ACTIONS: [&str; 3] = ["startHostDetection", "hostJoined", "getRecordingStatus"];
const COORDINATOR_ACTIONS: [&str; 6] = [
    "getStatus",
    "checkAuth",
    "authenticate",
    "recordingStarted",
    "recordingFailed",
    "recordingDetected",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    #[default]
    Dom,
    Polling,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Dom => "dom",
            DetectionMethod::Polling => "polling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    MaxRetries,
}

/// Messages the detector accepts from the coordinator and the status UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DetectorRequest {
    StartHostDetection {
        #[serde(default)]
        method: DetectionMethod,
    },
    HostJoined {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        participant: Option<Value>,
    },
    GetRecordingStatus,
}

/// Terminal outcomes the detector reports to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DetectorReport {
    RecordingStarted { success: bool },
    RecordingFailed { reason: FailureReason },
    RecordingDetected { success: bool },
}

impl DetectorReport {
    pub fn started() -> Self {
        DetectorReport::RecordingStarted { success: true }
    }

    pub fn failed(reason: FailureReason) -> Self {
        DetectorReport::RecordingFailed { reason }
    }

    pub fn detected() -> Self {
        DetectorReport::RecordingDetected { success: true }
    }
}

/// Messages the coordinator accepts from the status UI and from detectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CoordinatorRequest {
    GetStatus,
    CheckAuth,
    Authenticate,
    RecordingStarted { success: bool },
    RecordingFailed { reason: FailureReason },
    RecordingDetected { success: bool },
}

impl CoordinatorRequest {
    pub fn as_report(&self) -> Option<DetectorReport> {
        match self {
            CoordinatorRequest::RecordingStarted { success } => {
                Some(DetectorReport::RecordingStarted { success: *success })
            }
            CoordinatorRequest::RecordingFailed { reason } => {
                Some(DetectorReport::RecordingFailed { reason: *reason })
            }
            CoordinatorRequest::RecordingDetected { success } => {
                Some(DetectorReport::RecordingDetected { success: *success })
            }
            CoordinatorRequest::GetStatus
            | CoordinatorRequest::CheckAuth
            | CoordinatorRequest::Authenticate => None,
        }
    }
}

impl From<DetectorReport> for CoordinatorRequest {
    fn from(report: DetectorReport) -> Self {
        match report {
            DetectorReport::RecordingStarted { success } => {
                CoordinatorRequest::RecordingStarted { success }
            }
            DetectorReport::RecordingFailed { reason } => {
                CoordinatorRequest::RecordingFailed { reason }
            }
            DetectorReport::RecordingDetected { success } => {
                CoordinatorRequest::RecordingDetected { success }
            }
        }
    }
}

/// Signal pushed by an external integration (webhook relay, companion app).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub participant: Option<Value>,
}

impl ExternalMessage {
    /// Returns the participant payload when this announces a host joining.
    pub fn host_participant(&self) -> Option<&Value> {
        if self.kind != EXTERNAL_PARTICIPANT_JOINED {
            return None;
        }
        self.participant
            .as_ref()
            .filter(|participant| participant_is_host(participant))
    }
}

pub fn participant_is_host(participant: &Value) -> bool {
    participant
        .get("role")
        .and_then(Value::as_str)
        .map(|role| HOST_ROLES.contains(&role))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn rejected() -> Self {
        Self { success: false }
    }
}

/// Snapshot answered to `getRecordingStatus`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStatus {
    pub recording: bool,
    pub host_joined: bool,
}

/// Snapshot answered to `getStatus`. `subscription_id` is always present on
/// the wire, as `null` when no subscription exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub subscription_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCheck {
    pub authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub fn parse_detector_request(message: Value) -> Result<DetectorRequest, ErrorInfo> {
    require_known_action(&message, &DETECTOR_ACTIONS)?;
    serde_json::from_value(message).map_err(|err| {
        ErrorInfo::new(
            "invalid_message",
            format!("detector message is invalid: {}", err),
        )
    })
}

pub fn parse_coordinator_request(message: Value) -> Result<CoordinatorRequest, ErrorInfo> {
    require_known_action(&message, &COORDINATOR_ACTIONS)?;
    serde_json::from_value(message).map_err(|err| {
        ErrorInfo::new(
            "invalid_message",
            format!("coordinator message is invalid: {}", err),
        )
    })
}

pub fn parse_external_message(message: Value) -> Result<ExternalMessage, ErrorInfo> {
    serde_json::from_value(message).map_err(|err| {
        ErrorInfo::new(
            "invalid_message",
            format!("external message is invalid: {}", err),
        )
    })
}

/// Decodes a raw message body, enforcing the size cap before parsing.
pub fn decode_message(bytes: &[u8]) -> Result<Value, ErrorInfo> {
    if bytes.len() > MAX_MESSAGE_BYTES {
        return Err(ErrorInfo::new(
            "message_too_large",
            format!("message exceeds {} bytes", MAX_MESSAGE_BYTES),
        ));
    }
    serde_json::from_slice(bytes)
        .map_err(|err| ErrorInfo::new("invalid_message", format!("message is not JSON: {}", err)))
}

fn require_known_action(message: &Value, known: &[&str]) -> Result<(), ErrorInfo> {
    let Some(object) = message.as_object() else {
        return Err(ErrorInfo::new(
            "invalid_message",
            "message must be a JSON object",
        ));
    };
    let Some(action) = object.get("action").and_then(Value::as_str) else {
        return Err(ErrorInfo::new("invalid_message", "action is required"));
    };
    if known.contains(&action) {
        Ok(())
    } else {
        Err(ErrorInfo::new(
            "unknown_action",
            format!("unsupported action: {}", action),
        ))
    }
}
