//! Detector - owns the session for one page load and drives activation.
//!
//! Every step is a short synchronous read or click followed by scheduling
//! the next `Wake`. The host (see `runtime`) calls `on_wake` when a
//! continuation is due and `on_mutations` when the page changed.
//!
//! ## Flow
//!
//! ```text
//! start ─► PollJoin ─► PollHost ─► Locate ─┬─► click Direct ───────────────► started
//!            (fixed)     (fixed)     ▲      ├─► more options ─► SearchMenu ─┤
//!                                    │      └─► activities ──► SearchMenu ─┤
//!                                    │                                     ▼
//!                          backoff ◄─┴── attempt failed ◄── CheckPanel ─► FinishPanel
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use meet_recorder_protocol::{
    Ack, DetectionMethod, DetectorReport, DetectorRequest, FailureReason, RecordingStatus,
};

use crate::backoff::{activation_delay, poll_delay};
use crate::config::RecorderConfig;
use crate::confirm::{
    apply_options, assess_panel, find_consent_confirm, find_consent_dialog, find_panel,
    find_panel_start, PanelReadiness, ToggleOutcome,
};
use crate::detector::{assess_join, clearly_in_meeting, infer_host, HostSignal, JoinAssessment};
use crate::dom::{Mutation, Page};
use crate::error::{FailureKind, RecorderError};
use crate::locator::{
    find_activities, find_in_activities_panel, find_in_overflow_menu, find_more_options,
    find_toolbar_control, overflow_menu_open, ControlKind, LocatedControl, Surface,
};
use crate::observer::RecordingObserver;
use crate::scheduler::{Continuation, Millis, Scheduler, Wake};
use crate::session::{DetectionSession, Phase};
use crate::settings::SettingsStore;
use crate::trace::ActivationTrace;
use crate::transition::{next_phase, PhaseEvent};

/// Which path set `recordingStarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    Activation,
    Observer,
}

pub struct Detector {
    config: RecorderConfig,
    settings: Arc<dyn SettingsStore>,
    session: DetectionSession,
    observer: RecordingObserver,
    outbox: Vec<DetectorReport>,
    trace: ActivationTrace,
}

impl Detector {
    pub fn new(config: RecorderConfig, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            config,
            settings,
            session: DetectionSession::new(),
            observer: RecordingObserver::default(),
            outbox: Vec::new(),
            trace: ActivationTrace::default(),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn session(&self) -> &DetectionSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn status(&self) -> RecordingStatus {
        self.session.status()
    }

    pub fn trace(&self) -> &ActivationTrace {
        &self.trace
    }

    /// Reports waiting to be sent to the coordinator.
    pub fn drain_reports(&mut self) -> Vec<DetectorReport> {
        std::mem::take(&mut self.outbox)
    }

    fn enabled(&self) -> bool {
        self.settings.extension_enabled()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inbound messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Handles one message and returns the response payload.
    pub fn handle_request(
        &mut self,
        request: DetectorRequest,
        page: &mut dyn Page,
        scheduler: &mut dyn Scheduler,
    ) -> Value {
        debug!(session = %self.session.id, request = ?request, "Detector request received");
        match request {
            DetectorRequest::StartHostDetection { method } => {
                self.start_host_detection(method, page, scheduler);
                ack()
            }
            DetectorRequest::HostJoined { .. } => {
                self.handle_host_joined(page, scheduler);
                ack()
            }
            DetectorRequest::GetRecordingStatus => {
                serde_json::to_value(self.status()).unwrap_or(Value::Null)
            }
        }
    }

    /// Begins join polling. A no-op while detection is already running or
    /// after a terminal outcome other than `abandoned`.
    pub fn start_host_detection(
        &mut self,
        method: DetectionMethod,
        page: &mut dyn Page,
        scheduler: &mut dyn Scheduler,
    ) {
        if !self.enabled() {
            debug!(kind = FailureKind::ConfigurationDisabled.as_str(), "Extension disabled; not detecting");
            return;
        }
        let phase = self.session.phase;
        if next_phase(phase, PhaseEvent::DetectionRequested) == phase {
            debug!(session = %self.session.id, phase = %phase, "Detection already running or finished; ignoring start");
            return;
        }

        self.session.detection_method = method;
        self.session.join_polls = 0;
        self.session.host_polls = 0;
        self.advance(
            PhaseEvent::DetectionRequested,
            format!("detection requested via {}", method.as_str()),
            scheduler.now(),
        );
        self.poll_join(page, scheduler);
    }

    /// External host signal: skip detection and go straight to activation.
    pub fn handle_host_joined(&mut self, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        if self.session.recording_started() {
            debug!(session = %self.session.id, "Recording already started; ignoring host signal");
            return;
        }
        if !self.enabled() {
            debug!(kind = FailureKind::ConfigurationDisabled.as_str(), "Extension disabled; skipping recording");
            return;
        }
        let phase = self.session.phase;
        if next_phase(phase, PhaseEvent::ActivationForced) == phase {
            debug!(session = %self.session.id, phase = %phase, "Activation already running or finished");
            return;
        }

        self.session.mark_joined();
        self.session.mark_host(HostSignal::External);
        self.advance(PhaseEvent::ActivationForced, "host participant event", scheduler.now());
        self.attempt_locate(page, scheduler);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Continuations and page events
    // ─────────────────────────────────────────────────────────────────────────

    pub fn on_wake(&mut self, continuation: Continuation, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        let wake = continuation.wake;
        if continuation.session != self.session.id {
            debug!(wake = wake.as_str(), "Continuation from a replaced session; dropping");
            return;
        }
        if !page.is_live() {
            debug!(wake = wake.as_str(), "Page no longer live; dropping continuation");
            return;
        }
        if self.session.phase.is_terminal() || self.session.recording_started() {
            return;
        }
        if !self.enabled() {
            debug!(
                wake = wake.as_str(),
                kind = FailureKind::ConfigurationDisabled.as_str(),
                "Extension disabled; suspending"
            );
            self.advance(PhaseEvent::DetectionSuspended, "extension disabled", scheduler.now());
            return;
        }

        let phase = self.session.phase;
        match (wake, phase) {
            (Wake::PollJoin, Phase::DetectingJoin) => self.poll_join(page, scheduler),
            (Wake::PollHost, Phase::DetectingHost) => self.poll_host(page, scheduler),
            (Wake::Locate, Phase::LocatingControl) => self.attempt_locate(page, scheduler),
            (Wake::SearchMenu { surface, attempt }, Phase::LocatingControl) => {
                self.search_menu(surface, attempt, page, scheduler)
            }
            (Wake::CheckPanel { recheck }, Phase::Confirming) => self.check_panel(recheck, page, scheduler),
            (Wake::FinishPanel, Phase::Confirming) => self.finish_panel(page, scheduler),
            _ => debug!(wake = wake.as_str(), phase = %phase, "Continuation no longer applies"),
        }
    }

    /// Feeds a mutation batch to the passive observer.
    ///
    /// The observer only reads, so it runs even while the extension is
    /// disabled. It stops watching once recording has started.
    pub fn on_mutations(&mut self, mutations: &[Mutation], page: &dyn Page, now: Millis) {
        if !self.observer.observe(page.document(), mutations) {
            return;
        }
        self.complete(CompletionSource::Observer, "recording indicator observed", now);
    }

    /// Discards the session; anything still scheduled for it becomes stale.
    pub fn reset_for_navigation(&mut self) {
        info!(
            session = %self.session.id,
            phase = %self.session.phase,
            cancelled_work = self.session.phase.is_active(),
            "Page navigated; discarding session"
        );
        self.session = DetectionSession::new();
        self.trace.clear();
        self.observer.reconnect();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Join / host detection (fixed-interval polling)
    // ─────────────────────────────────────────────────────────────────────────

    fn poll_join(&mut self, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        self.session.join_polls += 1;
        let polls = self.session.join_polls;
        match assess_join(page.document()) {
            JoinAssessment::InCall => {
                self.session.mark_joined();
                self.advance(PhaseEvent::JoinConfirmed, format!("joined after {} checks", polls), scheduler.now());
                self.poll_host(page, scheduler);
            }
            assessment => {
                debug!(
                    session = %self.session.id,
                    polls,
                    assessment = ?assessment,
                    kind = FailureKind::TransientNotFound.as_str(),
                    "Not in call yet"
                );
                if polls >= self.config.max_retries {
                    warn!(session = %self.session.id, polls, "Join never detected; giving up");
                    self.advance(PhaseEvent::DetectionAbandoned, "join not detected", scheduler.now());
                    return;
                }
                self.schedule(scheduler, poll_delay(&self.config), Wake::PollJoin);
            }
        }
    }

    fn poll_host(&mut self, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        self.session.host_polls += 1;
        let polls = self.session.host_polls;
        let signal = infer_host(page.document(), page.url());
        let signal = match signal {
            Some(signal) => Some(signal),
            None if polls >= self.config.max_retries => {
                if clearly_in_meeting(page.document()) {
                    warn!(session = %self.session.id, polls, "No host signal; assuming host because the call is active");
                    Some(HostSignal::LastResort)
                } else {
                    warn!(session = %self.session.id, polls, "Host never detected; giving up");
                    self.advance(PhaseEvent::DetectionAbandoned, "host not detected", scheduler.now());
                    return;
                }
            }
            None => None,
        };

        match signal {
            Some(signal) => {
                self.session.mark_host(signal);
                self.advance(
                    PhaseEvent::HostInferred,
                    format!("host inferred from {}", signal.as_str()),
                    scheduler.now(),
                );
                self.attempt_locate(page, scheduler);
            }
            None => {
                debug!(session = %self.session.id, polls, "No host signal yet");
                self.schedule(scheduler, poll_delay(&self.config), Wake::PollHost);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Locator cascade (exponential backoff between attempts)
    // ─────────────────────────────────────────────────────────────────────────

    fn attempt_locate(&mut self, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        if self.session.recording_started() {
            return;
        }
        if let Some(control) = find_toolbar_control(page.document()) {
            self.invoke(control, page, scheduler);
            return;
        }

        // Re-clicking a toggle would close a menu left open by the last attempt.
        if overflow_menu_open(page.document()) {
            debug!(session = %self.session.id, "Overflow menu already open; searching it");
            self.search_menu(Surface::OverflowMenu, 1, page, scheduler);
            return;
        }

        if let Some(more) = find_more_options(page.document()) {
            match page.click(more) {
                Ok(()) => {
                    self.trace.push(scheduler.now(), self.session.phase, "opened more options");
                    self.schedule(
                        scheduler,
                        self.config.activation.menu_open_delay_ms,
                        Wake::SearchMenu {
                            surface: Surface::OverflowMenu,
                            attempt: 1,
                        },
                    );
                    return;
                }
                Err(err) => {
                    warn!(error = %err, kind = err.failure_kind().as_str(), "More options click failed");
                }
            }
        }
        self.open_activities(page, scheduler);
    }

    fn open_activities(&mut self, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        let Some(activities) = find_activities(page.document()) else {
            self.fail_attempt(FailureKind::TransientNotFound, "recording control not found", scheduler);
            return;
        };
        match page.click(activities) {
            Ok(()) => {
                self.trace.push(scheduler.now(), self.session.phase, "opened activities");
                self.schedule(
                    scheduler,
                    self.config.activation.menu_open_delay_ms,
                    Wake::SearchMenu {
                        surface: Surface::ActivitiesPanel,
                        attempt: 1,
                    },
                );
            }
            Err(err) => {
                warn!(error = %err, "Activities click failed");
                self.fail_attempt(err.failure_kind(), "activities click failed", scheduler);
            }
        }
    }

    fn search_menu(&mut self, surface: Surface, attempt: u32, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        let found = match surface {
            Surface::Toolbar => find_toolbar_control(page.document()),
            Surface::OverflowMenu => find_in_overflow_menu(page.document()),
            Surface::ActivitiesPanel => find_in_activities_panel(page.document()),
        };
        if let Some(control) = found {
            self.invoke(control, page, scheduler);
            return;
        }

        if attempt < self.config.activation.menu_search_attempts {
            debug!(surface = surface.as_str(), attempt, "Recording entry not rendered yet");
            self.schedule(
                scheduler,
                self.config.activation.menu_search_interval_ms,
                Wake::SearchMenu {
                    surface,
                    attempt: attempt + 1,
                },
            );
            return;
        }

        debug!(surface = surface.as_str(), attempt, "Recording entry not found on surface");
        match surface {
            Surface::OverflowMenu => self.open_activities(page, scheduler),
            _ => self.fail_attempt(FailureKind::TransientNotFound, "recording entry not found", scheduler),
        }
    }

    fn invoke(&mut self, control: LocatedControl, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        if let Err(err) = page.click(control.node) {
            warn!(error = %err, surface = control.surface.as_str(), "Recording control click failed");
            self.fail_attempt(err.failure_kind(), "recording control click failed", scheduler);
            return;
        }
        match control.kind {
            ControlKind::Direct => {
                self.complete(
                    CompletionSource::Activation,
                    format!("clicked recording control on {}", control.surface.as_str()),
                    scheduler.now(),
                );
            }
            ControlKind::ManagementEntry => {
                self.advance(
                    PhaseEvent::PanelOpened,
                    format!("opened recording panel from {}", control.surface.as_str()),
                    scheduler.now(),
                );
                self.schedule(
                    scheduler,
                    self.config.confirmation.panel_initial_delay_ms,
                    Wake::CheckPanel { recheck: false },
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Confirmation flow
    // ─────────────────────────────────────────────────────────────────────────

    fn check_panel(&mut self, recheck: bool, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        match assess_panel(page.document()) {
            PanelReadiness::Ready { panel, .. } => {
                let toggles = apply_options(page, panel, &self.config.confirmation);
                let toggled = toggles
                    .iter()
                    .filter(|toggle| toggle.outcome == ToggleOutcome::Toggled)
                    .count();
                self.trace.push(
                    scheduler.now(),
                    self.session.phase,
                    format!("panel ready; toggled {} option(s)", toggled),
                );
                self.schedule(scheduler, self.config.confirmation.settle_delay_ms, Wake::FinishPanel);
            }
            PanelReadiness::NotReady if !recheck => {
                debug!(session = %self.session.id, "Recording panel not ready; rechecking once");
                self.schedule(
                    scheduler,
                    self.config.confirmation.panel_recheck_delay_ms,
                    Wake::CheckPanel { recheck: true },
                );
            }
            PanelReadiness::NotReady => {
                self.fail_attempt(FailureKind::TransientNotFound, "recording panel never became ready", scheduler);
            }
        }
    }

    fn finish_panel(&mut self, page: &mut dyn Page, scheduler: &mut dyn Scheduler) {
        let panel = find_panel(page.document());
        if let Some(dialog) = find_consent_dialog(page.document(), panel) {
            match find_consent_confirm(page.document(), dialog) {
                Some(confirm) => match page.click(confirm) {
                    Ok(()) => self.trace.push(scheduler.now(), self.session.phase, "confirmed consent dialog"),
                    Err(err) => warn!(error = %err, "Consent confirm click failed"),
                },
                None => debug!("Consent dialog has no confirm control"),
            }
        }

        let start = find_panel(page.document()).and_then(|panel| find_panel_start(page.document(), panel));
        let Some(start) = start else {
            self.fail_attempt(FailureKind::TransientNotFound, "panel start control not found", scheduler);
            return;
        };
        match page.click(start) {
            Ok(()) => self.complete(CompletionSource::Activation, "clicked panel start", scheduler.now()),
            Err(err) => {
                warn!(error = %err, "Panel start click failed");
                self.fail_attempt(err.failure_kind(), "panel start click failed", scheduler);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outcomes
    // ─────────────────────────────────────────────────────────────────────────

    /// Whichever path gets here first reports; the other sees the flag and skips.
    fn complete(&mut self, source: CompletionSource, note: impl Into<String>, now: Millis) {
        if !self.session.mark_recording_started() {
            return;
        }
        let report = match source {
            CompletionSource::Activation => DetectorReport::started(),
            CompletionSource::Observer => DetectorReport::detected(),
        };
        self.advance(PhaseEvent::RecordingConfirmed, note, now);
        self.observer.disconnect();
        info!(session = %self.session.id, source = ?source, "Recording started");
        self.outbox.push(report);
    }

    fn fail_attempt(&mut self, kind: FailureKind, reason: &str, scheduler: &mut dyn Scheduler) {
        if self.session.recording_started() {
            return;
        }
        self.session.retry_count += 1;
        let attempt = self.session.retry_count;
        let now = scheduler.now();

        if attempt >= self.config.max_retries {
            let exhausted = RecorderError::RetryExhausted { attempts: attempt };
            error!(
                session = %self.session.id,
                error = %exhausted,
                kind = exhausted.failure_kind().as_str(),
                "Max retries reached, could not start recording"
            );
            self.advance(PhaseEvent::RetriesExhausted, reason.to_string(), now);
            self.outbox.push(DetectorReport::failed(FailureReason::MaxRetries));
            return;
        }

        let delay = activation_delay(&self.config, attempt);
        match kind {
            FailureKind::TransientNotFound => {
                debug!(session = %self.session.id, attempt, delay_ms = delay, reason, "Retrying activation")
            }
            _ => warn!(session = %self.session.id, attempt, delay_ms = delay, reason, kind = kind.as_str(), "Retrying activation"),
        }
        self.advance(
            PhaseEvent::AttemptFailed,
            format!("{}; retry {} in {}ms", reason, attempt, delay),
            now,
        );
        self.schedule(scheduler, delay, Wake::Locate);
    }

    fn advance(&mut self, event: PhaseEvent, note: impl Into<String>, now: Millis) {
        let from = self.session.phase;
        let to = next_phase(from, event);
        let note = note.into();
        if from != to {
            info!(session = %self.session.id, from = %from, to = %to, event = ?event, note = %note, "Phase changed");
        }
        self.session.phase = to;
        self.trace.push(now, to, note);
    }

    fn schedule(&self, scheduler: &mut dyn Scheduler, delay: Millis, wake: Wake) {
        scheduler.schedule(
            delay,
            Continuation {
                session: self.session.id,
                wake,
            },
        );
    }
}

fn ack() -> Value {
    serde_json::to_value(Ack::ok()).unwrap_or(Value::Null)
}
