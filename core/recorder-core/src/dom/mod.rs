//! Page model the engine reads and operates.
//!
//! The engine never touches a browser directly. It sees a `Document` through
//! the `Page` trait, clicks nodes through it, and learns about DOM changes
//! from the mutation records the page hands back.

mod document;
mod fixture;
mod types;

use serde::Serialize;

pub use document::{Document, ElementSpec, NodeId};
pub use fixture::{Change, ClickRecord, FixturePage, FixtureSpec, Reaction, TimedChange, DEFAULT_MEETING_URL};
pub use types::{BoundingBox, ViewportInfo};

use crate::error::Result;
use crate::scheduler::Millis;

/// One observed DOM change, in the shape a mutation observer reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    ChildList { target: NodeId },
    Attribute { target: NodeId, name: String },
}

impl Mutation {
    pub fn target(&self) -> NodeId {
        match self {
            Mutation::ChildList { target } | Mutation::Attribute { target, .. } => *target,
        }
    }
}

/// A live page as seen by the detector.
pub trait Page {
    fn document(&self) -> &Document;

    fn url(&self) -> &str;

    /// Dispatches a click. Fails when the node is detached or refuses input.
    fn click(&mut self, node: NodeId) -> Result<()>;

    /// False once the page navigated away or its context was invalidated.
    fn is_live(&self) -> bool {
        true
    }

    /// Applies any page-side changes due at or before `now`.
    fn sync(&mut self, _now: Millis) {}

    /// When the page will next change on its own, if ever.
    fn next_change_at(&self) -> Option<Millis> {
        None
    }

    fn take_mutations(&mut self) -> Vec<Mutation> {
        Vec::new()
    }
}
