//! Arena-backed element tree.
//!
//! Only elements are modeled; each element carries its own direct text.
//! `text_content` joins an element's text with all descendant text in DOM
//! order, space separated. Removed subtrees stay in the arena but are marked
//! detached so stale `NodeId`s are detectable.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::types::{BoundingBox, ViewportInfo};
use super::Mutation;
use crate::error::{RecorderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    checked: Option<bool>,
    rect: Option<BoundingBox>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            checked: None,
            rect: None,
            parent: None,
            children: Vec::new(),
            attached: true,
        }
    }
}

/// Declarative element description used by fixtures and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    /// Fixture handle for reactions and assertions; not an HTML attribute.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub rect: Option<BoundingBox>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// A `<button>` whose accessible name comes from `aria-label`.
    pub fn button(label: &str) -> Self {
        Self::new("button").attr("aria-label", label)
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Some(BoundingBox::new(x, y, width, height));
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
    viewport: ViewportInfo,
    mutations: Vec<Mutation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(ViewportInfo::default())
    }
}

impl Document {
    pub fn new(viewport: ViewportInfo) -> Self {
        Self {
            nodes: vec![Element::new("body")],
            root: NodeId(0),
            viewport,
            mutations: Vec::new(),
        }
    }

    /// Builds a document whose body holds `body` in order.
    pub fn from_specs(viewport: ViewportInfo, body: &[ElementSpec]) -> Self {
        let mut doc = Self::new(viewport);
        let mut keys = HashMap::new();
        for spec in body {
            doc.insert_spec(doc.root, spec, &mut keys);
        }
        doc.mutations.clear();
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn viewport(&self) -> &ViewportInfo {
        &self.viewport
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    fn live_element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        match self.nodes.get_mut(id.0) {
            Some(element) if element.attached => Ok(element),
            _ => Err(RecorderError::StaleNode(id)),
        }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.element(id).map(|e| e.attached).unwrap_or(false)
    }

    pub fn tag(&self, id: NodeId) -> &str {
        self.element(id).map(|e| e.tag.as_str()).unwrap_or("")
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.attributes.get(name))
            .map(String::as_str)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn role(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "role")
    }

    pub fn own_text(&self, id: NodeId) -> &str {
        self.element(id).map(|e| e.text.as_str()).unwrap_or("")
    }

    /// Own text followed by every descendant's text, in DOM order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let own = self.own_text(id).trim();
        if !own.is_empty() {
            parts.push(own);
        }
        for node in self.descendants(id) {
            let text = self.own_text(node).trim();
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    pub fn rect(&self, id: NodeId) -> Option<BoundingBox> {
        self.element(id).and_then(|e| e.rect)
    }

    /// Checked state from the `checked` property, falling back to `aria-checked`.
    pub fn checked(&self, id: NodeId) -> Option<bool> {
        if let Some(checked) = self.element(id).and_then(|e| e.checked) {
            return Some(checked);
        }
        match self.attr(id, "aria-checked") {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|s| *s == id)?;
        siblings.get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|s| *s == id)?;
        index.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    /// Ancestors from the parent upward, stopping after `depth` levels.
    pub fn ancestors(&self, id: NodeId, depth: usize) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            if out.len() >= depth {
                break;
            }
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Every attached element under the body, in DOM order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    pub fn element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id_value))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts `spec` (and its children) under `parent`, recording keyed nodes.
    pub fn insert_spec(
        &mut self,
        parent: NodeId,
        spec: &ElementSpec,
        keys: &mut HashMap<String, NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut element = Element::new(&spec.tag);
        element.attributes = spec.attrs.clone();
        element.text = spec.text.clone().unwrap_or_default();
        element.checked = spec.checked;
        element.rect = spec.rect;
        element.parent = Some(parent);
        self.nodes.push(element);
        if let Some(parent_element) = self.nodes.get_mut(parent.0) {
            parent_element.children.push(id);
        }
        self.mutations.push(Mutation::ChildList { target: parent });
        if let Some(key) = &spec.key {
            keys.insert(key.clone(), id);
        }
        for child in &spec.children {
            self.insert_spec(id, child, keys);
        }
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(RecorderError::InteractionFailed {
                target: "body".to_string(),
                details: "the root cannot be removed".to_string(),
            });
        }
        let parent = self.live_element_mut(id)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_element) = self.nodes.get_mut(parent.0) {
                parent_element.children.retain(|child| *child != id);
            }
            self.mutations.push(Mutation::ChildList { target: parent });
        }
        let mut detached = vec![id];
        detached.extend(self.descendants(id));
        for node in detached {
            if let Some(element) = self.nodes.get_mut(node.0) {
                element.attached = false;
            }
        }
        Ok(())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.live_element_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        self.mutations.push(Mutation::Attribute {
            target: id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<()> {
        if self.live_element_mut(id)?.attributes.remove(name).is_some() {
            self.mutations.push(Mutation::Attribute {
                target: id,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        self.live_element_mut(id)?.text = text.to_string();
        self.mutations.push(Mutation::ChildList { target: id });
        Ok(())
    }

    /// Sets the checked state where the element keeps it: the `checked`
    /// property for native inputs, `aria-checked` otherwise.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<()> {
        let element = self.live_element_mut(id)?;
        let name = if element.checked.is_some() || element.tag == "input" {
            element.checked = Some(checked);
            "checked"
        } else {
            element
                .attributes
                .insert("aria-checked".to_string(), checked.to_string());
            "aria-checked"
        };
        self.mutations.push(Mutation::Attribute {
            target: id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, HashMap<String, NodeId>) {
        let mut doc = Document::default();
        let mut keys = HashMap::new();
        let spec = ElementSpec::new("div")
            .key("toolbar")
            .child(ElementSpec::button("Leave call").key("leave"))
            .child(ElementSpec::new("span").text("Captions").key("caption-text"))
            .child(
                ElementSpec::new("div")
                    .key("group")
                    .child(ElementSpec::new("span").text("nested").key("nested")),
            );
        let root = doc.root();
        doc.insert_spec(root, &spec, &mut keys);
        doc.take_mutations();
        (doc, keys)
    }

    #[test]
    fn descendants_are_pre_order() {
        let (doc, keys) = sample();
        let order = doc.elements();
        assert_eq!(
            order,
            vec![
                keys["toolbar"],
                keys["leave"],
                keys["caption-text"],
                keys["group"],
                keys["nested"]
            ]
        );
    }

    #[test]
    fn text_content_joins_descendants() {
        let (doc, keys) = sample();
        assert_eq!(doc.text_content(keys["toolbar"]), "Captions nested");
    }

    #[test]
    fn siblings_and_ancestors() {
        let (doc, keys) = sample();
        assert_eq!(doc.next_sibling(keys["leave"]), Some(keys["caption-text"]));
        assert_eq!(doc.previous_sibling(keys["leave"]), None);
        assert_eq!(
            doc.ancestors(keys["nested"], 2),
            vec![keys["group"], keys["toolbar"]]
        );
        assert!(doc.contains(keys["toolbar"], keys["nested"]));
        assert!(!doc.contains(keys["group"], keys["leave"]));
    }

    #[test]
    fn remove_detaches_subtree_and_records_mutation() {
        let (mut doc, keys) = sample();
        doc.remove(keys["group"]).unwrap();
        assert!(!doc.is_attached(keys["nested"]));
        assert!(!doc.elements().contains(&keys["nested"]));
        assert_eq!(
            doc.take_mutations(),
            vec![Mutation::ChildList {
                target: keys["toolbar"]
            }]
        );
        assert!(matches!(
            doc.set_attr(keys["nested"], "x", "y"),
            Err(RecorderError::StaleNode(_))
        ));
    }

    #[test]
    fn checked_prefers_property_then_aria() {
        let mut doc = Document::default();
        let root = doc.root();
        let mut keys = HashMap::new();
        let native = doc.insert_spec(root, &ElementSpec::new("input").attr("type", "checkbox"), &mut keys);
        let aria = doc.insert_spec(
            root,
            &ElementSpec::new("div").attr("role", "checkbox").attr("aria-checked", "false"),
            &mut keys,
        );

        assert_eq!(doc.checked(native), None);
        doc.set_checked(native, true).unwrap();
        assert_eq!(doc.checked(native), Some(true));

        assert_eq!(doc.checked(aria), Some(false));
        doc.set_checked(aria, true).unwrap();
        assert_eq!(doc.attr(aria, "aria-checked"), Some("true"));
    }

    #[test]
    fn element_by_id_finds_first_match() {
        let mut doc = Document::default();
        let root = doc.root();
        let label = doc.insert_spec(root, &ElementSpec::new("span").attr("id", "cap-label"), &mut HashMap::new());
        assert_eq!(doc.element_by_id("cap-label"), Some(label));
        assert_eq!(doc.element_by_id("missing"), None);
    }
}
