//! Passive recording-indicator watch.
//!
//! Recording may start out of band (the user clicks it, or the app
//! auto-records). The observer looks at each relevant batch of mutations
//! and reports once when an indicator shows up. It never touches the page.

use tracing::debug;

use crate::dom::{Document, Mutation};
use crate::query::catalog::RECORDING_INDICATOR;

/// Attribute changes that can reveal an indicator.
pub const OBSERVED_ATTRIBUTES: [&str; 2] = ["aria-label", "data-tooltip"];

#[derive(Debug, Clone)]
pub struct RecordingObserver {
    watching: bool,
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self { watching: true }
    }
}

impl RecordingObserver {
    pub fn disconnect(&mut self) {
        self.watching = false;
    }

    pub fn reconnect(&mut self) {
        self.watching = true;
    }

    pub fn is_relevant(mutation: &Mutation) -> bool {
        match mutation {
            Mutation::ChildList { .. } => true,
            Mutation::Attribute { name, .. } => OBSERVED_ATTRIBUTES.contains(&name.as_str()),
        }
    }

    pub fn indicator_present(doc: &Document) -> bool {
        RECORDING_INDICATOR.is_present(doc)
    }

    /// True when this batch reveals an indicator. Irrelevant batches are not
    /// evaluated at all.
    pub fn observe(&self, doc: &Document, mutations: &[Mutation]) -> bool {
        if !self.watching || !mutations.iter().any(Self::is_relevant) {
            return false;
        }
        let present = Self::indicator_present(doc);
        if present {
            debug!(mutations = mutations.len(), "Recording indicator observed");
        }
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, ViewportInfo};

    #[test]
    fn ignores_unrelated_attribute_changes() {
        let doc = Document::from_specs(
            ViewportInfo::default(),
            &[ElementSpec::new("div").attr("aria-label", "This call is being recorded")],
        );
        let observer = RecordingObserver::default();
        let class_change = [Mutation::Attribute {
            target: doc.root(),
            name: "class".to_string(),
        }];
        assert!(!observer.observe(&doc, &class_change));

        let label_change = [Mutation::Attribute {
            target: doc.root(),
            name: "aria-label".to_string(),
        }];
        assert!(observer.observe(&doc, &label_change));
    }

    #[test]
    fn start_button_is_not_an_indicator() {
        let doc = Document::from_specs(ViewportInfo::default(), &[ElementSpec::button("Start recording")]);
        assert!(!RecordingObserver::indicator_present(&doc));
    }

    #[test]
    fn disconnected_observer_stays_quiet() {
        let doc = Document::from_specs(
            ViewportInfo::default(),
            &[ElementSpec::new("div").attr("role", "status").text("Recording in progress")],
        );
        let mut observer = RecordingObserver::default();
        observer.disconnect();
        assert!(!observer.observe(&doc, &[Mutation::ChildList { target: doc.root() }]));
        observer.reconnect();
        assert!(observer.observe(&doc, &[Mutation::ChildList { target: doc.root() }]));
    }
}
