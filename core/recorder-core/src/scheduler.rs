//! Timer-driven continuations.
//!
//! The engine never blocks. Every wait is a `Continuation` handed to a
//! `Scheduler`, and the host calls back into the detector when it is due.
//! Continuations carry the session id they were scheduled for so a wake-up
//! from a replaced session is recognized and dropped.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::Serialize;
use ulid::Ulid;

use crate::locator::Surface;

/// Virtual or wall-clock milliseconds since the page loaded.
pub type Millis = u64;

/// What the detector should do when a continuation fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "wake", rename_all = "snake_case")]
pub enum Wake {
    PollJoin,
    PollHost,
    /// Run the locator cascade from the top.
    Locate,
    /// Search an opened menu or panel for the recording entry.
    SearchMenu { surface: Surface, attempt: u32 },
    /// Readiness check of the recording panel; `recheck` marks the single retry.
    CheckPanel { recheck: bool },
    /// Consent dialog and start click, after options settled.
    FinishPanel,
}

impl Wake {
    pub fn as_str(&self) -> &'static str {
        match self {
            Wake::PollJoin => "poll_join",
            Wake::PollHost => "poll_host",
            Wake::Locate => "locate",
            Wake::SearchMenu { .. } => "search_menu",
            Wake::CheckPanel { .. } => "check_panel",
            Wake::FinishPanel => "finish_panel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub session: Ulid,
    pub wake: Wake,
}

pub trait Scheduler {
    fn now(&self) -> Millis;
    fn schedule(&mut self, delay: Millis, continuation: Continuation);
}

/// One `schedule` call, kept for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledRecord {
    pub at: Millis,
    pub delay: Millis,
    pub wake: Wake,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    due: Millis,
    seq: u64,
    continuation: Continuation,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deterministic clock: time only moves when the host advances it.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now: Millis,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry>>,
    history: Vec<ScheduledRecord>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pops the earliest continuation due at or before `limit`, moving the
    /// clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, limit: Millis) -> Option<Continuation> {
        if self.next_due()? > limit {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.continuation)
    }

    pub fn advance_to(&mut self, at: Millis) {
        self.now = self.now.max(at);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn history(&self) -> &[ScheduledRecord] {
        &self.history
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Millis {
        self.now
    }

    fn schedule(&mut self, delay: Millis, continuation: Continuation) {
        self.seq += 1;
        let due = self.now.saturating_add(delay);
        self.history.push(ScheduledRecord {
            at: self.now,
            delay,
            wake: continuation.wake,
        });
        self.queue.push(Reverse(Entry {
            due,
            seq: self.seq,
            continuation,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cont(wake: Wake) -> Continuation {
        Continuation {
            session: Ulid::nil(),
            wake,
        }
    }

    #[test]
    fn pops_in_due_then_fifo_order() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.schedule(500, cont(Wake::Locate));
        scheduler.schedule(100, cont(Wake::PollJoin));
        scheduler.schedule(100, cont(Wake::PollHost));

        assert_eq!(scheduler.pop_due(1_000).unwrap().wake, Wake::PollJoin);
        assert_eq!(scheduler.now(), 100);
        assert_eq!(scheduler.pop_due(1_000).unwrap().wake, Wake::PollHost);
        assert_eq!(scheduler.pop_due(1_000).unwrap().wake, Wake::Locate);
        assert_eq!(scheduler.now(), 500);
        assert!(scheduler.pop_due(1_000).is_none());
    }

    #[test]
    fn respects_limit() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.schedule(2_000, cont(Wake::PollJoin));
        assert!(scheduler.pop_due(1_999).is_none());
        assert_eq!(scheduler.now(), 0);
        assert_eq!(scheduler.next_due(), Some(2_000));
    }

    #[test]
    fn history_records_delays() {
        let mut scheduler = VirtualScheduler::new();
        scheduler.advance_to(50);
        scheduler.schedule(2_000, cont(Wake::Locate));
        assert_eq!(
            scheduler.history(),
            &[ScheduledRecord {
                at: 50,
                delay: 2_000,
                wake: Wake::Locate
            }]
        );
    }
}
