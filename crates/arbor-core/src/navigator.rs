//! Path walking
//!
//! A path is a sequence of [`Step`]s. A key step selects the first object
//! member with that name; an index step selects an array element. Any step
//! that does not apply to the node it meets ends the walk with a miss, which
//! is not an error.

use arbor_json_domain::Step;

use crate::document::{Document, DocumentState};
use crate::registry::Handle;
use crate::tree::{Node, NodeId};
use crate::Result;

impl DocumentState {
    /// Child of `parent` selected by `step`
    pub(crate) fn child(&self, parent: NodeId, step: &Step) -> Option<NodeId> {
        match (self.arena.get(parent)?, step) {
            (Node::Object(members), Step::Key(key)) => members
                .iter()
                .find(|m| m.name.resolve(&self.buffer) == key)
                .map(|m| m.value),
            (Node::Array(items), Step::Index(index)) => items.get(*index).copied(),
            _ => None,
        }
    }

    /// Node reached from `start` by following `steps`
    pub(crate) fn walk(&self, start: NodeId, steps: &[Step]) -> Option<NodeId> {
        steps
            .iter()
            .try_fold(start, |node, step| self.child(node, step))
    }
}

impl Document {
    /// Follow `steps` from `from` (the root when `None`)
    ///
    /// Returns `Ok(None)` when the path does not exist. The node found is
    /// registered, so the returned handle stays valid until the document is
    /// reset or the node is deep-removed.
    pub fn find(&self, from: Option<Handle>, steps: &[Step]) -> Result<Option<Handle>> {
        let mut state = self.inner.borrow_mut();
        let start = state.resolve(from)?;
        let Some(found) = state.walk(start, steps) else {
            tracing::trace!(path = ?steps, "path not found");
            return Ok(None);
        };
        Ok(Some(state.register(found, false)))
    }
}
