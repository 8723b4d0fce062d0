//! Declarative element queries.
//!
//! The conferencing app ships no stable identifiers, so every control the
//! engine needs is described as an ordered list of lookup strategies plus an
//! exclusion list. A query is recomputed against the live document on every
//! call; nothing is cached between reads.
//!
//! Resolution order:
//!
//! 1. Strategies run in declaration order; the first one with a hit wins.
//! 2. Within a strategy, the first match in DOM order wins.
//! 3. A candidate whose composite label contains an excluded term is skipped
//!    no matter which strategy selected it.

pub mod catalog;

use crate::dom::{Document, NodeId};
use crate::labels::{composite_label, is_checkbox};

/// Share of the viewport height above which lower-region lookups ignore elements.
pub const LOWER_REGION_FRACTION: f64 = 0.5;

/// Which elements a label or position strategy considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidates {
    /// `button` elements and `role="button"`.
    Interactive,
    /// Interactive elements plus menu items, options and list items.
    MenuItems,
    Checkboxes,
    /// Dialogs, side panels and regions.
    Panels,
    Dialogs,
    /// Menus and listboxes.
    Containers,
    /// Live regions and status roles.
    Status,
    Any,
}

impl Candidates {
    pub fn admits(&self, doc: &Document, id: NodeId) -> bool {
        let role = doc.role(id);
        let interactive = doc.tag(id) == "button" || role == Some("button");
        let modal = doc.attr(id, "aria-modal") == Some("true");
        match self {
            Candidates::Interactive => interactive,
            Candidates::MenuItems => {
                interactive
                    || doc.tag(id) == "li"
                    || matches!(
                        role,
                        Some("menuitem") | Some("menuitemcheckbox") | Some("option") | Some("listitem")
                    )
            }
            Candidates::Checkboxes => is_checkbox(doc, id),
            Candidates::Panels => {
                modal
                    || matches!(
                        role,
                        Some("dialog") | Some("alertdialog") | Some("complementary") | Some("region")
                    )
            }
            Candidates::Dialogs => modal || matches!(role, Some("dialog") | Some("alertdialog")),
            Candidates::Containers => matches!(role, Some("menu") | Some("listbox")),
            Candidates::Status => {
                matches!(role, Some("status") | Some("alert")) || doc.has_attr(id, "aria-live")
            }
            Candidates::Any => true,
        }
    }
}

/// Case-insensitive substring rule over a composite label.
///
/// Every term in `all` must appear; when `any` is non-empty at least one of
/// its terms must appear too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRule {
    pub all: &'static [&'static str],
    pub any: &'static [&'static str],
}

impl LabelRule {
    pub const fn contains(term: &'static [&'static str]) -> Self {
        Self { all: term, any: &[] }
    }

    pub const fn any_of(terms: &'static [&'static str]) -> Self {
        Self { all: &[], any: terms }
    }

    pub fn matches(&self, label: &str) -> bool {
        self.all.iter().all(|term| label.contains(term))
            && (self.any.is_empty() || self.any.iter().any(|term| label.contains(term)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Composite label (aria-label, text, tooltip) satisfies `rule`.
    Label {
        candidates: Candidates,
        rule: LabelRule,
    },
    /// Works like CSS `[name*=needle]`; case-sensitive unless flagged.
    AttributeContains {
        name: &'static str,
        needle: &'static str,
        case_insensitive: bool,
    },
    AttributeEquals {
        name: &'static str,
        value: &'static str,
    },
    AttributePresent {
        name: &'static str,
    },
    /// Label match restricted to elements centered in the lower viewport.
    LowerViewport {
        candidates: Candidates,
        rule: LabelRule,
    },
}

impl Strategy {
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match self {
            Strategy::Label { candidates, rule } => {
                candidates.admits(doc, id) && rule.matches(&composite_label(doc, id))
            }
            Strategy::AttributeContains {
                name,
                needle,
                case_insensitive,
            } => match doc.attr(id, name) {
                Some(value) if *case_insensitive => {
                    value.to_lowercase().contains(&needle.to_lowercase())
                }
                Some(value) => value.contains(needle),
                None => false,
            },
            Strategy::AttributeEquals { name, value } => doc.attr(id, name) == Some(*value),
            Strategy::AttributePresent { name } => doc.has_attr(id, name),
            Strategy::LowerViewport { candidates, rule } => {
                candidates.admits(doc, id)
                    && doc
                        .rect(id)
                        .map(|rect| rect.is_in_lower_region(doc.viewport(), LOWER_REGION_FRACTION))
                        .unwrap_or(false)
                    && rule.matches(&composite_label(doc, id))
            }
        }
    }
}

/// A named target plus how to find it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiElementQuery {
    pub target: &'static str,
    pub strategies: &'static [Strategy],
    pub exclude: &'static [&'static str],
}

impl UiElementQuery {
    pub fn is_excluded(&self, doc: &Document, id: NodeId) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let label = composite_label(doc, id);
        self.exclude.iter().any(|term| label.contains(term))
    }

    /// First match under `scope` (exclusive), honoring strategy order.
    pub fn resolve(&self, doc: &Document, scope: NodeId) -> Option<NodeId> {
        let nodes = doc.descendants(scope);
        self.strategies.iter().find_map(|strategy| {
            nodes
                .iter()
                .copied()
                .find(|node| strategy.matches(doc, *node) && !self.is_excluded(doc, *node))
        })
    }

    /// Every match under `scope`, strategy order first, then DOM order, deduplicated.
    pub fn resolve_all(&self, doc: &Document, scope: NodeId) -> Vec<NodeId> {
        let nodes = doc.descendants(scope);
        let mut out: Vec<NodeId> = Vec::new();
        for strategy in self.strategies {
            for node in &nodes {
                if !out.contains(node) && strategy.matches(doc, *node) && !self.is_excluded(doc, *node) {
                    out.push(*node);
                }
            }
        }
        out
    }

    pub fn is_present(&self, doc: &Document) -> bool {
        self.resolve(doc, doc.root()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, ViewportInfo};

    static RECORDISH: UiElementQuery = UiElementQuery {
        target: "recordish",
        strategies: &[
            Strategy::Label {
                candidates: Candidates::Interactive,
                rule: LabelRule::contains(&["record"]),
            },
            Strategy::AttributeContains {
                name: "aria-label",
                needle: "Record",
                case_insensitive: false,
            },
        ],
        exclude: &["stop"],
    };

    fn doc(body: Vec<ElementSpec>) -> Document {
        Document::from_specs(ViewportInfo::default(), &body)
    }

    #[test]
    fn first_strategy_wins_over_dom_order() {
        let d = doc(vec![
            ElementSpec::new("div").attr("aria-label", "Record"),
            ElementSpec::button("Start recording"),
        ]);
        let found = RECORDISH.resolve(&d, d.root()).unwrap();
        assert_eq!(d.tag(found), "button");
    }

    #[test]
    fn exclusion_beats_every_strategy() {
        let d = doc(vec![ElementSpec::button("Stop Recording")]);
        assert_eq!(RECORDISH.resolve(&d, d.root()), None);
    }

    #[test]
    fn attribute_contains_is_case_sensitive_by_default() {
        let d = doc(vec![ElementSpec::new("div").attr("aria-label", "record panel")]);
        assert!(!RECORDISH.is_present(&d));
    }

    #[test]
    fn resolve_all_deduplicates() {
        let d = doc(vec![ElementSpec::button("Record"), ElementSpec::button("Recordings")]);
        assert_eq!(RECORDISH.resolve_all(&d, d.root()).len(), 2);
    }

    #[test]
    fn lower_viewport_requires_geometry() {
        let strategy = Strategy::LowerViewport {
            candidates: Candidates::Interactive,
            rule: LabelRule::any_of(&["more", "options"]),
        };
        let d = doc(vec![
            ElementSpec::button("More options").rect(10.0, 10.0, 40.0, 40.0),
            ElementSpec::button("More options"),
            ElementSpec::button("More options").rect(600.0, 660.0, 40.0, 40.0),
        ]);
        let hits: Vec<NodeId> = d
            .elements()
            .into_iter()
            .filter(|node| strategy.matches(&d, *node))
            .collect();
        assert_eq!(hits, vec![d.elements()[2]]);
    }

    #[test]
    fn label_rule_all_and_any() {
        let rule = LabelRule {
            all: &["record"],
            any: &["start", "manage"],
        };
        assert!(rule.matches("manage recording"));
        assert!(!rule.matches("recordings"));
    }
}
