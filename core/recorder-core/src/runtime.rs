//! Single-threaded host loop binding a detector to one page.
//!
//! The loop interleaves the page's own changes with the detector's scheduled
//! continuations in time order and forwards every mutation batch to the
//! passive observer. With `Pace::Virtual` time jumps straight to the next
//! event; `Pace::RealTime` sleeps until it is due.

use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use meet_recorder_protocol::{
    decode_message, parse_detector_request, DetectorReport, DetectorRequest, ErrorInfo,
};

use crate::dom::Page;
use crate::orchestrator::Detector;
use crate::scheduler::{Millis, Scheduler, VirtualScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pace {
    #[default]
    Virtual,
    RealTime,
}

pub struct PageRuntime<P: Page> {
    detector: Detector,
    page: P,
    scheduler: VirtualScheduler,
    pace: Pace,
    started_at: Instant,
}

impl<P: Page> PageRuntime<P> {
    pub fn new(detector: Detector, page: P) -> Self {
        Self::with_pace(detector, page, Pace::Virtual)
    }

    pub fn with_pace(detector: Detector, page: P, pace: Pace) -> Self {
        Self {
            detector,
            page,
            scheduler: VirtualScheduler::new(),
            pace,
            started_at: Instant::now(),
        }
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut Detector {
        &mut self.detector
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn scheduler(&self) -> &VirtualScheduler {
        &self.scheduler
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    /// The page finished loading: detection starts without waiting for the
    /// coordinator.
    pub fn page_ready(&mut self) {
        let method = self.detector.session().detection_method;
        self.detector
            .start_host_detection(method, &mut self.page, &mut self.scheduler);
        self.dispatch_mutations();
    }

    pub fn deliver(&mut self, request: DetectorRequest) -> Value {
        let response = self
            .detector
            .handle_request(request, &mut self.page, &mut self.scheduler);
        self.dispatch_mutations();
        response
    }

    /// Validates a raw message before delivering it.
    pub fn deliver_json(&mut self, message: Value) -> Result<Value, ErrorInfo> {
        let request = parse_detector_request(message)?;
        Ok(self.deliver(request))
    }

    /// Raw message as received from the coordinator, size-capped.
    pub fn deliver_bytes(&mut self, bytes: &[u8]) -> Result<Value, ErrorInfo> {
        let message = decode_message(bytes)?;
        self.deliver_json(message)
    }

    /// The page navigated away: drop the session and everything it scheduled.
    pub fn navigate_away(&mut self) {
        self.detector.reset_for_navigation();
        self.scheduler.clear();
    }

    pub fn drain_reports(&mut self) -> Vec<DetectorReport> {
        self.detector.drain_reports()
    }

    /// Processes page changes and continuations due at or before `limit`.
    pub fn run_until(&mut self, limit: Millis) {
        loop {
            let next = match (self.scheduler.next_due(), self.page.next_change_at()) {
                (Some(wake), Some(change)) => wake.min(change),
                (Some(wake), None) => wake,
                (None, Some(change)) => change,
                (None, None) => break,
            };
            if next > limit {
                break;
            }

            self.wait_until(next);
            self.scheduler.advance_to(next);
            self.page.sync(next);
            self.dispatch_mutations();

            while let Some(continuation) = self.scheduler.pop_due(next) {
                debug!(at = next, wake = continuation.wake.as_str(), "Continuation due");
                self.detector
                    .on_wake(continuation, &mut self.page, &mut self.scheduler);
                self.dispatch_mutations();
            }
        }
        if limit != Millis::MAX {
            self.scheduler.advance_to(limit);
            self.page.sync(limit);
            self.dispatch_mutations();
        }
    }

    /// Runs until nothing is scheduled and the page has no pending changes.
    pub fn run_until_idle(&mut self) {
        self.run_until(Millis::MAX);
    }

    fn wait_until(&self, at: Millis) {
        if self.pace != Pace::RealTime {
            return;
        }
        let target = self.started_at + Duration::from_millis(at);
        let now = Instant::now();
        if target > now {
            thread::sleep(target - now);
        }
    }

    fn dispatch_mutations(&mut self) {
        let mutations = self.page.take_mutations();
        if mutations.is_empty() {
            return;
        }
        let now = self.scheduler.now();
        self.detector.on_mutations(&mutations, &self.page, now);
    }
}
