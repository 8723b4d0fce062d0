//! Coordinator state and message handling.
//!
//! The coordinator never talks to a page directly. Every method that wants
//! a detector to act returns a `Dispatch` naming the tab and the request;
//! the host delivers it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use meet_recorder_core::SettingsStore;
use meet_recorder_protocol::{
    decode_message, parse_coordinator_request, parse_external_message, Ack, AuthCheck, AuthStatus,
    CoordinatorRequest, DetectionMethod, DetectorReport, DetectorRequest, ErrorInfo,
    RecordingStatus,
};

use crate::status::StatusSummary;
use crate::tabs::{is_meeting_url, TabId, TrackedTab, TAB_STATUS_COMPLETE};

/// A request the host should deliver to one tab's detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub tab_id: TabId,
    pub request: DetectorRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub report: DetectorReport,
    pub received_at: DateTime<Utc>,
}

pub struct Coordinator {
    settings: Arc<dyn SettingsStore>,
    auth: AuthStatus,
    current_tab: Option<TrackedTab>,
    reports: HashMap<TabId, Vec<ReportRecord>>,
}

impl Coordinator {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            auth: AuthStatus::default(),
            current_tab: None,
            reports: HashMap::new(),
        }
    }

    pub fn current_tab(&self) -> Option<&TrackedTab> {
        self.current_tab.as_ref()
    }

    pub fn auth_status(&self) -> &AuthStatus {
        &self.auth
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tab lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// A tab changed. A meeting tab that finished loading becomes current
    /// and is told to start DOM detection.
    pub fn on_tab_updated(&mut self, tab_id: TabId, status: &str, url: &str) -> Option<Dispatch> {
        if status != TAB_STATUS_COMPLETE {
            return None;
        }
        if !is_meeting_url(url) {
            if self.is_current(tab_id) {
                info!(tab_id, url = %url, "Current tab left the meeting");
                self.current_tab = None;
            }
            return None;
        }

        let tab = TrackedTab::new(tab_id, url);
        info!(
            tab_id,
            meeting_code = tab.meeting_code.as_deref().unwrap_or("-"),
            "Meeting tab loaded"
        );
        self.current_tab = Some(tab);

        // Auth is inert, so the DOM path is always the one taken.
        Some(Dispatch {
            tab_id,
            request: DetectorRequest::StartHostDetection {
                method: DetectionMethod::Dom,
            },
        })
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        if self.is_current(tab_id) {
            debug!(tab_id, "Current meeting tab closed");
            self.current_tab = None;
        }
        self.reports.remove(&tab_id);
    }

    fn is_current(&self, tab_id: TabId) -> bool {
        self.current_tab
            .as_ref()
            .map(|tab| tab.tab_id == tab_id)
            .unwrap_or(false)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Handles a runtime message from the status UI (`sender` is `None`) or
    /// from a tab's detector.
    pub fn handle_message(&mut self, sender: Option<TabId>, message: Value) -> Result<Value, ErrorInfo> {
        let request = parse_coordinator_request(message)?;
        let response = match request {
            CoordinatorRequest::GetStatus => to_value(&self.auth),
            CoordinatorRequest::CheckAuth => to_value(&AuthCheck {
                authenticated: self.auth.authenticated,
            }),
            CoordinatorRequest::Authenticate => {
                warn!("Authentication is not available; staying on DOM detection");
                to_value(&Ack::rejected())
            }
            report => {
                if let Some(report) = report.as_report() {
                    self.record_report(sender, report);
                }
                to_value(&Ack::ok())
            }
        };
        Ok(response)
    }

    /// Raw form of `handle_message`; oversized or non-JSON bytes are rejected
    /// before parsing.
    pub fn handle_message_bytes(&mut self, sender: Option<TabId>, bytes: &[u8]) -> Result<Value, ErrorInfo> {
        let message = decode_message(bytes)?;
        self.handle_message(sender, message)
    }

    pub fn handle_external_bytes(&mut self, bytes: &[u8]) -> Result<Option<Dispatch>, ErrorInfo> {
        let message = decode_message(bytes)?;
        self.handle_external(message)
    }

    /// Handles a message from an external integration. A host joining the
    /// meeting is relayed to the current tab.
    pub fn handle_external(&mut self, message: Value) -> Result<Option<Dispatch>, ErrorInfo> {
        let message = parse_external_message(message)?;
        let Some(participant) = message.host_participant() else {
            debug!(kind = %message.kind, "External message is not a host join; ignoring");
            return Ok(None);
        };
        let Some(tab) = self.current_tab.as_ref() else {
            debug!("Host joined but no meeting tab is current");
            return Ok(None);
        };

        info!(tab_id = tab.tab_id, "Relaying external host join");
        Ok(Some(Dispatch {
            tab_id: tab.tab_id,
            request: DetectorRequest::HostJoined {
                participant: Some(participant.clone()),
            },
        }))
    }

    fn record_report(&mut self, sender: Option<TabId>, report: DetectorReport) {
        match &report {
            DetectorReport::RecordingStarted { .. } => info!(tab_id = ?sender, "Recording started successfully"),
            DetectorReport::RecordingDetected { .. } => info!(tab_id = ?sender, "Recording detected in UI"),
            DetectorReport::RecordingFailed { reason } => {
                error!(tab_id = ?sender, reason = ?reason, "Recording failed")
            }
        }

        let Some(tab_id) = sender.or_else(|| self.current_tab.as_ref().map(|tab| tab.tab_id)) else {
            warn!("Report has no sender tab; not recorded");
            return;
        };
        self.reports.entry(tab_id).or_default().push(ReportRecord {
            report,
            received_at: Utc::now(),
        });
    }

    pub fn reports_for(&self, tab_id: TabId) -> &[ReportRecord] {
        self.reports
            .get(&tab_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn latest_report(&self, tab_id: TabId) -> Option<&ReportRecord> {
        self.reports_for(tab_id).last()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings and status
    // ─────────────────────────────────────────────────────────────────────────

    pub fn extension_enabled(&self) -> bool {
        self.settings.extension_enabled()
    }

    pub fn set_extension_enabled(&self, enabled: bool) -> meet_recorder_core::Result<()> {
        self.settings.set_extension_enabled(enabled)?;
        info!(enabled, "Extension flag updated");
        Ok(())
    }

    /// Summary for the current tab, given its detector's status answer.
    pub fn status_summary(&self, recording: Option<RecordingStatus>) -> StatusSummary {
        let url = self.current_tab.as_ref().map(|tab| tab.url.as_str());
        StatusSummary::derive(url, recording, &self.auth)
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
