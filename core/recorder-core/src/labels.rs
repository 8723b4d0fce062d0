//! Label resolution for controls without stable identifiers.
//!
//! Two questions are answered here: what does a control call itself (the
//! composite label used by every label strategy), and which checkbox does a
//! piece of visible text describe.

use crate::dom::{Document, NodeId};
use crate::patterns::normalize_label;

/// Normalized `aria-label`, text content and `data-tooltip`, space joined.
pub fn composite_label(doc: &Document, id: NodeId) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if let Some(aria) = doc.attr(id, "aria-label") {
        parts.push(aria.to_string());
    }
    parts.push(doc.text_content(id));
    if let Some(tooltip) = doc.attr(id, "data-tooltip") {
        parts.push(tooltip.to_string());
    }
    normalize_label(&parts.join(" "))
}

pub fn is_checkbox(doc: &Document, id: NodeId) -> bool {
    let native = doc.tag(id) == "input" && doc.attr(id, "type") == Some("checkbox");
    native || matches!(doc.role(id), Some("checkbox") | Some("switch"))
}

/// Which layer of the label search matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    LabelElement,
    AriaLabel,
    AriaLabelledBy,
    Ancestor(usize),
    Sibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckboxMatch {
    pub node: NodeId,
    pub source: LabelSource,
}

/// Finds the checkbox under `scope` whose label mentions `needle`.
///
/// Each layer is tried over every checkbox before the next, weaker layer
/// runs, so an explicit `<label>` anywhere beats a nearby-text guess.
pub fn find_checkbox(
    doc: &Document,
    scope: NodeId,
    needle: &str,
    ancestor_depth: usize,
) -> Option<CheckboxMatch> {
    let needle = normalize_label(needle);
    let boxes: Vec<NodeId> = doc
        .descendants(scope)
        .into_iter()
        .filter(|node| is_checkbox(doc, *node))
        .collect();
    if boxes.is_empty() {
        return None;
    }

    let mentions = |text: &str| normalize_label(text).contains(&needle);
    let first = |source: LabelSource, test: &dyn Fn(NodeId) -> bool| {
        boxes
            .iter()
            .copied()
            .find(|node| test(*node))
            .map(|node| CheckboxMatch { node, source })
    };

    first(LabelSource::LabelElement, &|node| {
        label_element_text(doc, node)
            .map(|text| mentions(&text))
            .unwrap_or(false)
    })
    .or_else(|| {
        first(LabelSource::AriaLabel, &|node| {
            doc.attr(node, "aria-label")
                .map(|text| mentions(text))
                .unwrap_or(false)
        })
    })
    .or_else(|| {
        first(LabelSource::AriaLabelledBy, &|node| {
            labelledby_text(doc, node)
                .map(|text| mentions(&text))
                .unwrap_or(false)
        })
    })
    .or_else(|| {
        (1..=ancestor_depth).find_map(|level| {
            first(LabelSource::Ancestor(level), &|node| {
                doc.ancestors(node, level)
                    .get(level - 1)
                    .filter(|ancestor| owns_only(doc, scope, **ancestor, node, &boxes))
                    .map(|ancestor| mentions(&doc.text_content(*ancestor)))
                    .unwrap_or(false)
            })
        })
    })
    .or_else(|| {
        first(LabelSource::Sibling, &|node| {
            label_sibling(doc, node, &boxes)
                .map(|sibling| mentions(&doc.text_content(sibling)))
                .unwrap_or(false)
        })
    })
}

/// `ancestor` lies within `scope` and wraps no checkbox other than `node`.
fn owns_only(doc: &Document, scope: NodeId, ancestor: NodeId, node: NodeId, boxes: &[NodeId]) -> bool {
    doc.contains(scope, ancestor)
        && boxes
            .iter()
            .all(|other| *other == node || !doc.contains(ancestor, *other))
}

/// The text sibling labelling `node` in a flat row of checkboxes.
///
/// Labels sit on the same side of every box in a row: if the first box has
/// text before it, each box takes its previous sibling, otherwise its next.
fn label_sibling(doc: &Document, node: NodeId, boxes: &[NodeId]) -> Option<NodeId> {
    let parent = doc.parent(node)?;
    let first_box = doc
        .children(parent)
        .iter()
        .copied()
        .find(|child| boxes.contains(child))?;
    let leading_text = doc
        .previous_sibling(first_box)
        .map(|sibling| !boxes.contains(&sibling) && !doc.text_content(sibling).trim().is_empty())
        .unwrap_or(false);
    let sibling = if leading_text {
        doc.previous_sibling(node)?
    } else {
        doc.next_sibling(node)?
    };
    (!boxes.contains(&sibling)).then_some(sibling)
}

/// Text of a `<label for=id>` or of the nearest wrapping `<label>`.
fn label_element_text(doc: &Document, node: NodeId) -> Option<String> {
    if let Some(id_value) = doc.attr(node, "id") {
        let explicit = doc
            .elements()
            .into_iter()
            .find(|candidate| doc.tag(*candidate) == "label" && doc.attr(*candidate, "for") == Some(id_value));
        if let Some(label) = explicit {
            return Some(doc.text_content(label));
        }
    }
    let mut current = doc.parent(node);
    while let Some(ancestor) = current {
        if doc.tag(ancestor) == "label" {
            return Some(doc.text_content(ancestor));
        }
        current = doc.parent(ancestor);
    }
    None
}

fn labelledby_text(doc: &Document, node: NodeId) -> Option<String> {
    let ids = doc.attr(node, "aria-labelledby")?;
    let text: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id_value| doc.element_by_id(id_value))
        .map(|label| doc.text_content(label))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, ViewportInfo};

    fn checkbox() -> ElementSpec {
        ElementSpec::new("input").attr("type", "checkbox").checked(false)
    }

    fn doc(body: Vec<ElementSpec>) -> Document {
        Document::from_specs(ViewportInfo::default(), &body)
    }

    fn first_checkbox(doc: &Document) -> NodeId {
        doc.elements()
            .into_iter()
            .find(|node| is_checkbox(doc, *node))
            .unwrap()
    }

    #[test]
    fn composite_label_joins_all_sources() {
        let d = doc(vec![ElementSpec::new("button")
            .attr("aria-label", "Activities")
            .attr("data-tooltip", "Open   Tools")
            .child(ElementSpec::new("span").text("Tools"))]);
        let button = d.elements()[0];
        assert_eq!(composite_label(&d, button), "activities tools open tools");
    }

    #[test]
    fn explicit_label_for() {
        let d = doc(vec![
            ElementSpec::new("label").attr("for", "cc").text("Include captions"),
            checkbox().attr("id", "cc"),
        ]);
        let found = find_checkbox(&d, d.root(), "caption", 3).unwrap();
        assert_eq!(found.source, LabelSource::LabelElement);
    }

    #[test]
    fn wrapping_label() {
        let d = doc(vec![ElementSpec::new("label")
            .text("Also start a transcript")
            .child(checkbox())]);
        let found = find_checkbox(&d, d.root(), "transcript", 3).unwrap();
        assert_eq!(found.source, LabelSource::LabelElement);
    }

    #[test]
    fn aria_label_then_labelledby() {
        let d = doc(vec![
            checkbox().attr("aria-label", "Include captions"),
            ElementSpec::new("span").attr("id", "t").text("Start transcript"),
            checkbox().attr("aria-labelledby", "t"),
        ]);
        assert_eq!(
            find_checkbox(&d, d.root(), "caption", 3).unwrap().source,
            LabelSource::AriaLabel
        );
        assert_eq!(
            find_checkbox(&d, d.root(), "transcript", 3).unwrap().source,
            LabelSource::AriaLabelledBy
        );
    }

    #[test]
    fn ancestor_search_respects_depth() {
        let nested = ElementSpec::new("div").text("Include captions").child(
            ElementSpec::new("div").child(ElementSpec::new("div").child(ElementSpec::new("div").child(checkbox()))),
        );
        let d = doc(vec![nested]);
        assert_eq!(
            find_checkbox(&d, d.root(), "caption", 4).unwrap().source,
            LabelSource::Ancestor(4)
        );
        assert!(find_checkbox(&d, d.root(), "caption", 3).is_none());
    }

    #[test]
    fn sibling_text_is_last_resort() {
        let d = doc(vec![ElementSpec::new("div")
            .child(checkbox())
            .child(ElementSpec::new("span").text("Include captions"))]);
        // the wrapping div also mentions captions, so the ancestor layer wins
        assert_eq!(
            find_checkbox(&d, d.root(), "caption", 3).unwrap().source,
            LabelSource::Ancestor(1)
        );
        let bare = doc(vec![checkbox(), ElementSpec::new("span").text("Include captions")]);
        let found = find_checkbox(&bare, bare.root(), "caption", 0).unwrap();
        assert_eq!(found.source, LabelSource::Sibling);
        assert_eq!(found.node, first_checkbox(&bare));
    }

    #[test]
    fn shared_container_does_not_label_every_box() {
        let d = doc(vec![ElementSpec::new("div")
            .child(checkbox().attr("name", "cc"))
            .child(ElementSpec::new("span").text("Include captions"))
            .child(checkbox().attr("name", "tx"))
            .child(ElementSpec::new("span").text("Also start a transcript"))]);
        let captions = find_checkbox(&d, d.root(), "caption", 3).unwrap();
        let transcript = find_checkbox(&d, d.root(), "transcript", 3).unwrap();
        assert_eq!(captions.source, LabelSource::Sibling);
        assert_eq!(d.attr(captions.node, "name"), Some("cc"));
        assert_eq!(transcript.source, LabelSource::Sibling);
        assert_eq!(d.attr(transcript.node, "name"), Some("tx"));
    }

    #[test]
    fn leading_labels_pair_with_the_following_box() {
        let d = doc(vec![ElementSpec::new("div")
            .child(ElementSpec::new("span").text("Include captions"))
            .child(checkbox().attr("name", "cc"))
            .child(ElementSpec::new("span").text("Also start a transcript"))
            .child(checkbox().attr("name", "tx"))]);
        let transcript = find_checkbox(&d, d.root(), "transcript", 3).unwrap();
        assert_eq!(d.attr(transcript.node, "name"), Some("tx"));
        let captions = find_checkbox(&d, d.root(), "caption", 3).unwrap();
        assert_eq!(d.attr(captions.node, "name"), Some("cc"));
    }

    #[test]
    fn ancestor_search_stops_at_scope() {
        let d = doc(vec![ElementSpec::new("div")
            .text("Include captions")
            .child(ElementSpec::new("div").attr("id", "panel").child(checkbox()))]);
        let panel = d.element_by_id("panel").unwrap();
        assert!(find_checkbox(&d, panel, "caption", 3).is_none());
        assert!(find_checkbox(&d, d.root(), "caption", 3).is_some());
    }

    #[test]
    fn role_switch_counts_as_checkbox() {
        let d = doc(vec![ElementSpec::new("div")
            .attr("role", "switch")
            .attr("aria-checked", "false")
            .attr("aria-label", "Include captions")]);
        assert!(find_checkbox(&d, d.root(), "caption", 3).is_some());
    }
}
