//! JSON-scripted page used for simulation and tests.
//!
//! A fixture describes the initial body, a set of click reactions and a
//! timeline of changes that happen on their own. Delayed reactions model the
//! conferencing app's render latency: a menu that appears 200ms after the
//! click, a side panel that populates three seconds later.
//!
//! ```json
//! {
//!   "url": "https://meet.google.com/abc-defg-hij",
//!   "body": [{ "tag": "button", "key": "leave", "attrs": { "aria-label": "Leave call" } }],
//!   "reactions": [
//!     { "onClick": "more", "afterMs": 200, "changes": [
//!       { "op": "insert", "element": { "tag": "div", "attrs": { "role": "menu" } } }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Document, ElementSpec, Mutation, NodeId, Page, ViewportInfo};
use crate::error::{RecorderError, Result};
use crate::scheduler::Millis;

pub const DEFAULT_MEETING_URL: &str = "https://meet.google.com/abc-defg-hij";

fn default_url() -> String {
    DEFAULT_MEETING_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureSpec {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub viewport: ViewportInfo,
    #[serde(default)]
    pub body: Vec<ElementSpec>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub timeline: Vec<TimedChange>,
    /// Keys whose clicks fail as if the element refused input.
    #[serde(default)]
    pub failing_clicks: Vec<String>,
}

impl Default for FixtureSpec {
    fn default() -> Self {
        Self {
            url: default_url(),
            viewport: ViewportInfo::default(),
            body: Vec::new(),
            reactions: Vec::new(),
            timeline: Vec::new(),
            failing_clicks: Vec::new(),
        }
    }
}

/// Changes applied when the keyed element is clicked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub on_click: String,
    #[serde(default)]
    pub after_ms: Millis,
    /// Fire on every click instead of only the first.
    #[serde(default)]
    pub repeat: bool,
    pub changes: Vec<Change>,
}

/// Changes applied at an absolute time, independent of any click.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedChange {
    pub at_ms: Millis,
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    /// Appends `element` under the keyed parent, or under the body.
    Insert {
        #[serde(default)]
        parent: Option<String>,
        element: ElementSpec,
    },
    Remove {
        key: String,
    },
    SetAttribute {
        key: String,
        name: String,
        value: String,
    },
    RemoveAttribute {
        key: String,
        name: String,
    },
    SetText {
        key: String,
        text: String,
    },
    SetChecked {
        key: String,
        checked: bool,
    },
    Navigate,
}

#[derive(Debug, Clone)]
struct PendingChange {
    due: Millis,
    seq: u64,
    changes: Vec<Change>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRecord {
    pub at: Millis,
    pub node: NodeId,
    pub key: Option<String>,
}

#[derive(Debug)]
pub struct FixturePage {
    doc: Document,
    url: String,
    keys: HashMap<String, NodeId>,
    reactions: Vec<Reaction>,
    fired: HashSet<usize>,
    pending: Vec<PendingChange>,
    seq: u64,
    failing: HashSet<String>,
    clicks: Vec<ClickRecord>,
    now: Millis,
    live: bool,
}

impl FixturePage {
    pub fn from_spec(spec: FixtureSpec) -> Self {
        let mut doc = Document::new(spec.viewport);
        let mut keys = HashMap::new();
        let root = doc.root();
        for element in &spec.body {
            doc.insert_spec(root, element, &mut keys);
        }
        doc.take_mutations();

        let mut page = Self {
            doc,
            url: spec.url,
            keys,
            reactions: spec.reactions,
            fired: HashSet::new(),
            pending: Vec::new(),
            seq: 0,
            failing: spec.failing_clicks.into_iter().collect(),
            clicks: Vec::new(),
            now: 0,
            live: true,
        };
        for timed in spec.timeline {
            page.enqueue(timed.at_ms, timed.changes);
        }
        page
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let spec: FixtureSpec = serde_json::from_str(json).map_err(|source| RecorderError::Json {
            context: "parsing page fixture".to_string(),
            source,
        })?;
        Ok(Self::from_spec(spec))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).map_err(|source| RecorderError::Io {
            context: format!("reading fixture {}", path.display()),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn node(&self, key: &str) -> Option<NodeId> {
        self.keys
            .get(key)
            .copied()
            .filter(|id| self.doc.is_attached(*id))
    }

    pub fn key_of(&self, node: NodeId) -> Option<&str> {
        self.keys
            .iter()
            .find(|(_, id)| **id == node)
            .map(|(key, _)| key.as_str())
    }

    pub fn clicks(&self) -> &[ClickRecord] {
        &self.clicks
    }

    pub fn click_count(&self, key: &str) -> usize {
        self.clicks
            .iter()
            .filter(|click| click.key.as_deref() == Some(key))
            .count()
    }

    pub fn is_checked(&self, key: &str) -> Option<bool> {
        self.node(key).and_then(|id| self.doc.checked(id))
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn navigate_away(&mut self) {
        self.live = false;
        self.pending.clear();
    }

    /// Applies changes directly, as if the app re-rendered out of band.
    pub fn apply_now(&mut self, changes: &[Change]) {
        for change in changes {
            self.apply(change);
        }
    }

    fn enqueue(&mut self, due: Millis, changes: Vec<Change>) {
        self.seq += 1;
        self.pending.push(PendingChange {
            due,
            seq: self.seq,
            changes,
        });
    }

    fn is_toggle(&self, node: NodeId) -> bool {
        let is_native = self.doc.tag(node) == "input" && self.doc.attr(node, "type") == Some("checkbox");
        is_native || matches!(self.doc.role(node), Some("checkbox") | Some("switch"))
    }

    fn refuses_input(&self, node: NodeId, key: Option<&str>) -> Option<String> {
        if self.doc.has_attr(node, "disabled") || self.doc.attr(node, "aria-disabled") == Some("true") {
            return Some("element is disabled".to_string());
        }
        match key {
            Some(key) if self.failing.contains(key) => Some("click was not delivered".to_string()),
            _ => None,
        }
    }

    fn lookup(&self, key: &str) -> Option<NodeId> {
        let node = self.node(key);
        if node.is_none() {
            warn!(key = %key, "Fixture change references unknown or detached key; skipping");
        }
        node
    }

    fn apply(&mut self, change: &Change) {
        let outcome = match change {
            Change::Insert { parent, element } => {
                let parent = match parent {
                    Some(key) => match self.lookup(key) {
                        Some(node) => node,
                        None => return,
                    },
                    None => self.doc.root(),
                };
                self.doc.insert_spec(parent, element, &mut self.keys);
                Ok(())
            }
            Change::Remove { key } => match self.lookup(key) {
                Some(node) => self.doc.remove(node),
                None => return,
            },
            Change::SetAttribute { key, name, value } => match self.lookup(key) {
                Some(node) => self.doc.set_attr(node, name, value),
                None => return,
            },
            Change::RemoveAttribute { key, name } => match self.lookup(key) {
                Some(node) => self.doc.remove_attr(node, name),
                None => return,
            },
            Change::SetText { key, text } => match self.lookup(key) {
                Some(node) => self.doc.set_text(node, text),
                None => return,
            },
            Change::SetChecked { key, checked } => match self.lookup(key) {
                Some(node) => self.doc.set_checked(node, *checked),
                None => return,
            },
            Change::Navigate => {
                self.navigate_away();
                Ok(())
            }
        };
        if let Err(err) = outcome {
            warn!(error = %err, "Fixture change could not be applied");
        }
    }
}

impl Page for FixturePage {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn click(&mut self, node: NodeId) -> Result<()> {
        if !self.live {
            return Err(RecorderError::PageGone);
        }
        if !self.doc.is_attached(node) {
            return Err(RecorderError::StaleNode(node));
        }
        let key = self.key_of(node).map(str::to_string);
        if let Some(details) = self.refuses_input(node, key.as_deref()) {
            return Err(RecorderError::InteractionFailed {
                target: key.unwrap_or_else(|| self.doc.tag(node).to_string()),
                details,
            });
        }

        debug!(node = node.index(), key = ?key, at = self.now, "Fixture click");
        self.clicks.push(ClickRecord {
            at: self.now,
            node,
            key: key.clone(),
        });

        if self.is_toggle(node) {
            let next = !self.doc.checked(node).unwrap_or(false);
            self.doc.set_checked(node, next)?;
        }

        let Some(key) = key else {
            return Ok(());
        };
        let triggered: Vec<(usize, Millis, Vec<Change>)> = self
            .reactions
            .iter()
            .enumerate()
            .filter(|(index, reaction)| {
                reaction.on_click == key && (reaction.repeat || !self.fired.contains(index))
            })
            .map(|(index, reaction)| (index, reaction.after_ms, reaction.changes.clone()))
            .collect();
        for (index, after_ms, changes) in triggered {
            self.fired.insert(index);
            if after_ms == 0 {
                self.apply_now(&changes);
            } else {
                let due = self.now + after_ms;
                self.enqueue(due, changes);
            }
        }
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn sync(&mut self, now: Millis) {
        self.now = self.now.max(now);
        loop {
            let next = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, pending)| pending.due <= self.now)
                .min_by_key(|(_, pending)| (pending.due, pending.seq))
                .map(|(index, _)| index);
            let Some(index) = next else {
                break;
            };
            let due = self.pending.remove(index);
            debug!(due = due.due, changes = due.changes.len(), "Applying scheduled fixture changes");
            self.apply_now(&due.changes);
            if !self.live {
                break;
            }
        }
    }

    fn next_change_at(&self) -> Option<Millis> {
        self.pending.iter().map(|pending| pending.due).min()
    }

    fn take_mutations(&mut self) -> Vec<Mutation> {
        self.doc.take_mutations()
    }
}
