//! Recording panel reads and option toggles.
//!
//! The panel renders in stages: an empty shell first, then its options and
//! start button seconds later. Timing of the readiness checks belongs to the
//! orchestrator; this module decides what "ready" means and performs the
//! idempotent checkbox toggles.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ConfirmationConfig;
use crate::dom::{Document, NodeId, Page};
use crate::labels::find_checkbox;
use crate::patterns::normalize_label;
use crate::query::catalog::{CONSENT_CONFIRM, CONSENT_DIALOG, PANEL_START, RECORDING_PANEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelReadiness {
    Ready { panel: NodeId, start: NodeId },
    NotReady,
}

/// The recording panel, or the whole page when no panel container is
/// rendered but the page talks about recording.
pub fn find_panel(doc: &Document) -> Option<NodeId> {
    RECORDING_PANEL.resolve(doc, doc.root()).or_else(|| {
        normalize_label(&doc.text_content(doc.root()))
            .contains("record")
            .then(|| doc.root())
    })
}

pub fn find_panel_start(doc: &Document, panel: NodeId) -> Option<NodeId> {
    PANEL_START.resolve(doc, panel)
}

/// Ready means panel text is rendered and its start control exists.
pub fn assess_panel(doc: &Document) -> PanelReadiness {
    let Some(panel) = find_panel(doc) else {
        return PanelReadiness::NotReady;
    };
    match find_panel_start(doc, panel) {
        Some(start) => PanelReadiness::Ready { panel, start },
        None => PanelReadiness::NotReady,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelOption {
    Captions,
    Transcript,
}

impl PanelOption {
    /// Substring the checkbox label must contain.
    pub fn needle(&self) -> &'static str {
        match self {
            PanelOption::Captions => "caption",
            PanelOption::Transcript => "transcript",
        }
    }

    pub fn enabled_options(config: &ConfirmationConfig) -> Vec<PanelOption> {
        let mut options = Vec::with_capacity(2);
        if config.include_captions {
            options.push(PanelOption::Captions);
        }
        if config.start_transcript {
            options.push(PanelOption::Transcript);
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Toggled,
    AlreadyChecked,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionToggle {
    pub option: PanelOption,
    pub outcome: ToggleOutcome,
}

/// Checks every configured option that is currently unchecked.
///
/// A missing or unclickable checkbox is logged and skipped; the recording
/// can still start without it.
pub fn apply_options(page: &mut dyn Page, panel: NodeId, config: &ConfirmationConfig) -> Vec<OptionToggle> {
    PanelOption::enabled_options(config)
        .into_iter()
        .map(|option| {
            let found = find_checkbox(page.document(), panel, option.needle(), config.label_ancestor_depth);
            let outcome = match found {
                None => {
                    debug!(option = option.needle(), "Option checkbox not found");
                    ToggleOutcome::NotFound
                }
                Some(found) if page.document().checked(found.node) == Some(true) => {
                    ToggleOutcome::AlreadyChecked
                }
                Some(found) => match page.click(found.node) {
                    Ok(()) => {
                        debug!(option = option.needle(), source = ?found.source, "Option checkbox toggled");
                        ToggleOutcome::Toggled
                    }
                    Err(err) => {
                        warn!(option = option.needle(), error = %err, "Option checkbox click failed");
                        ToggleOutcome::Failed
                    }
                },
            };
            OptionToggle { option, outcome }
        })
        .collect()
}

/// A consent dialog other than the panel itself.
pub fn find_consent_dialog(doc: &Document, panel: Option<NodeId>) -> Option<NodeId> {
    CONSENT_DIALOG
        .resolve_all(doc, doc.root())
        .into_iter()
        .find(|dialog| Some(*dialog) != panel)
}

pub fn find_consent_confirm(doc: &Document, dialog: NodeId) -> Option<NodeId> {
    CONSENT_CONFIRM.resolve(doc, dialog)
}
