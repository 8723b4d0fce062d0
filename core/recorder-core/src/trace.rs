//! Activation trace for diagnostics.

use serde::Serialize;

use crate::scheduler::Millis;
use crate::session::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub at_ms: Millis,
    pub phase: Phase,
    pub note: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivationTrace {
    entries: Vec<TraceEntry>,
}

impl ActivationTrace {
    pub fn push(&mut self, at_ms: Millis, phase: Phase, note: impl Into<String>) {
        self.entries.push(TraceEntry {
            at_ms,
            phase,
            note: note.into(),
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One line per entry: `+<ms> <phase> <note>`, ms right-aligned.
pub fn format_trace(trace: &ActivationTrace) -> String {
    trace
        .entries()
        .iter()
        .map(|entry| format!("+{:>7}ms {:<16} {}", entry.at_ms, entry.phase.as_str(), entry.note))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_aligned_lines() {
        let mut trace = ActivationTrace::default();
        trace.push(0, Phase::DetectingJoin, "detection requested");
        trace.push(2_000, Phase::DetectingHost, "joined");
        let text = format_trace(&trace);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "+      0ms detecting-join   detection requested");
        assert!(lines[1].starts_with("+   2000ms detecting-host"));
    }
}
