//! # meet-recorder-coordinator
//!
//! The process-wide half of the recorder. It watches tab updates, tells the
//! detector on a meeting tab when to start, relays host-joined signals from
//! external integrations and collects the detector's terminal reports.
//!
//! Authentication is inert: the status surface always reports
//! unauthenticated, so every meeting tab falls back to DOM detection.

mod coordinator;
pub mod status;
pub mod tabs;

pub use coordinator::{Coordinator, Dispatch, ReportRecord};
pub use status::{AuthLabel, MeetingLabel, RecordingLabel, StatusSummary};
pub use tabs::{is_meeting_url, meeting_code, TabId, TrackedTab};
