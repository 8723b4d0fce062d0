//! Surfaces where the recording control can live.
//!
//! Each function reads one surface of the cascade. Opening menus and
//! waiting for them to render is the orchestrator's job; these only answer
//! "is it there right now".

use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::labels::composite_label;
use crate::query::catalog::{
    ACTIVITIES, ACTIVITIES_PANEL, MENU_CONTAINERS, MORE_OPTIONS, RECORD_CONTROL, RECORD_MENU_ITEM,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Clicking it starts recording.
    Direct,
    /// Clicking it opens the recording side panel.
    ManagementEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Toolbar,
    OverflowMenu,
    ActivitiesPanel,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Toolbar => "toolbar",
            Surface::OverflowMenu => "overflow_menu",
            Surface::ActivitiesPanel => "activities_panel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedControl {
    pub node: NodeId,
    pub kind: ControlKind,
    pub surface: Surface,
}

/// Entries in the activities panel always lead to the recording panel.
pub fn classify(doc: &Document, node: NodeId, surface: Surface) -> ControlKind {
    if surface == Surface::ActivitiesPanel || composite_label(doc, node).contains("manage") {
        ControlKind::ManagementEntry
    } else {
        ControlKind::Direct
    }
}

fn located(doc: &Document, node: NodeId, surface: Surface) -> LocatedControl {
    LocatedControl {
        node,
        kind: classify(doc, node, surface),
        surface,
    }
}

/// Label scan over every interactive element, then the attribute patterns.
pub fn find_toolbar_control(doc: &Document) -> Option<LocatedControl> {
    RECORD_CONTROL
        .resolve(doc, doc.root())
        .map(|node| located(doc, node, Surface::Toolbar))
}

pub fn find_more_options(doc: &Document) -> Option<NodeId> {
    MORE_OPTIONS.resolve(doc, doc.root())
}

pub fn overflow_menu_open(doc: &Document) -> bool {
    MENU_CONTAINERS.is_present(doc)
}

/// Searches open menus; with no menu container rendered, the whole page.
pub fn find_in_overflow_menu(doc: &Document) -> Option<LocatedControl> {
    let containers = MENU_CONTAINERS.resolve_all(doc, doc.root());
    let node = if containers.is_empty() {
        RECORD_MENU_ITEM.resolve(doc, doc.root())
    } else {
        containers
            .into_iter()
            .find_map(|menu| RECORD_MENU_ITEM.resolve(doc, menu))
    };
    node.map(|node| located(doc, node, Surface::OverflowMenu))
}

pub fn find_activities(doc: &Document) -> Option<NodeId> {
    ACTIVITIES.resolve(doc, doc.root())
}

pub fn find_in_activities_panel(doc: &Document) -> Option<LocatedControl> {
    let panel = ACTIVITIES_PANEL.resolve(doc, doc.root())?;
    RECORD_MENU_ITEM
        .resolve(doc, panel)
        .map(|node| located(doc, node, Surface::ActivitiesPanel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, ViewportInfo};

    fn doc(body: Vec<ElementSpec>) -> Document {
        Document::from_specs(ViewportInfo::default(), &body)
    }

    #[test]
    fn toolbar_label_scan_skips_stop() {
        let d = doc(vec![
            ElementSpec::button("Stop recording"),
            ElementSpec::new("div")
                .attr("role", "button")
                .child(ElementSpec::new("span").text("Record meeting")),
        ]);
        let found = find_toolbar_control(&d).unwrap();
        assert_eq!(d.tag(found.node), "div");
        assert_eq!(found.kind, ControlKind::Direct);
    }

    #[test]
    fn attribute_pattern_fallback_finds_non_buttons() {
        let d = doc(vec![ElementSpec::new("span").attr("data-tooltip", "Record")]);
        assert!(find_toolbar_control(&d).is_some());
    }

    #[test]
    fn more_options_prefers_lower_toolbar() {
        let d = doc(vec![
            ElementSpec::button("More options").rect(1200.0, 10.0, 40.0, 40.0),
            ElementSpec::button("More options").rect(700.0, 660.0, 40.0, 40.0),
        ]);
        assert_eq!(find_more_options(&d), Some(d.elements()[1]));
    }

    #[test]
    fn more_options_falls_back_to_attributes() {
        let d = doc(vec![ElementSpec::new("div").attr("data-tooltip", "More actions")]);
        assert!(find_more_options(&d).is_some());
    }

    #[test]
    fn manage_entry_in_menu() {
        let d = doc(vec![ElementSpec::new("ul").attr("role", "menu").child(
            ElementSpec::new("li")
                .attr("role", "menuitem")
                .child(ElementSpec::new("span").text("Manage recording")),
        )]);
        let found = find_in_overflow_menu(&d).unwrap();
        assert_eq!(found.kind, ControlKind::ManagementEntry);
        assert_eq!(found.surface, Surface::OverflowMenu);
    }

    #[test]
    fn activities_entries_are_management() {
        let d = doc(vec![ElementSpec::new("div")
            .attr("role", "complementary")
            .attr("aria-label", "Activities")
            .child(ElementSpec::new("div").attr("role", "button").text("Recording"))]);
        let found = find_in_activities_panel(&d).unwrap();
        assert_eq!(found.kind, ControlKind::ManagementEntry);
    }
}
