//! Subtree removal
//!
//! Deep removal moves a subtree into a new standalone [`Document`]; the
//! source forgets every handle inside the subtree. Shallow removal detaches
//! the subtree but leaves it in the source arena as an orphan, readable
//! through its handle until the source is reset or destroyed.

use arbor_json_domain::Step;
use smallvec::{SmallVec, smallvec};

use crate::document::{Document, DocumentState};
use crate::memory::NodeArena;
use crate::registry::Handle;
use crate::tree::{JsonStr, Member, Node, NodeId};
use crate::{Error, Result};

/// How [`Document::remove`] hands the subtree back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Copy into a new document and free the source nodes
    Deep,
    /// Detach in place and keep the handle
    Shallow,
}

/// A removed subtree
#[derive(Debug)]
pub enum Removed {
    /// Standalone document holding the subtree
    Deep(Document),
    /// Orphan handle in the source document
    Shallow(Handle),
}

impl Removed {
    /// The new document, for deep removals
    pub fn into_document(self) -> Option<Document> {
        match self {
            Removed::Deep(doc) => Some(doc),
            Removed::Shallow(_) => None,
        }
    }

    /// The orphan handle, for shallow removals
    pub fn handle(&self) -> Option<Handle> {
        match self {
            Removed::Deep(_) => None,
            Removed::Shallow(handle) => Some(*handle),
        }
    }
}

/// Copy a subtree into `dst`, giving every string its own bytes
fn copy_subtree(src: &NodeArena, buffer: &str, id: NodeId, dst: &mut NodeArena) -> Result<NodeId> {
    let copied = match src.get(id).ok_or(Error::InvalidHandle)? {
        Node::Null => Node::Null,
        Node::Bool(b) => Node::Bool(*b),
        Node::Number(n) => Node::Number(*n),
        Node::String(s) => Node::String(JsonStr::Owned(s.resolve(buffer).into())),
        Node::Array(items) => Node::Array(
            items
                .iter()
                .map(|item| copy_subtree(src, buffer, *item, dst))
                .collect::<Result<_>>()?,
        ),
        Node::Object(members) => Node::Object(
            members
                .iter()
                .map(|m| {
                    Ok(Member {
                        name: JsonStr::Owned(m.name.resolve(buffer).into()),
                        value: copy_subtree(src, buffer, m.value, dst)?,
                    })
                })
                .collect::<Result<_>>()?,
        ),
    };
    dst.alloc(copied)
}

impl DocumentState {
    /// Unlink the child of `parent` selected by `step`
    fn detach(&mut self, parent: NodeId, step: &Step) -> Option<NodeId> {
        match (self.arena.get_mut(parent)?, step) {
            (Node::Object(members), Step::Key(key)) => {
                let pos = members
                    .iter()
                    .position(|m| m.name.resolve(&self.buffer) == key)?;
                Some(members.remove(pos).value)
            }
            (Node::Array(items), Step::Index(index)) if *index < items.len() => {
                Some(items.remove(*index))
            }
            _ => None,
        }
    }

    /// Unregister every handle inside a detached subtree and free its slots
    fn forget_subtree(&mut self, id: NodeId) -> usize {
        let mut forgotten = 0;
        let mut stack: SmallVec<[NodeId; 32]> = smallvec![id];
        while let Some(next) = stack.pop() {
            let handle = self.handle(next);
            if self.registry.unregister(&handle).is_some() {
                forgotten += 1;
            }
            if let Some(node) = self.arena.get(next) {
                stack.extend(node.children());
            }
        }
        self.arena.release(id);
        forgotten
    }
}

impl Document {
    /// Remove the node reached from `from` by `steps`
    ///
    /// Returns `Ok(None)` without touching the tree when the path does not
    /// exist. The root cannot be removed, so `steps` must not be empty.
    pub fn remove(
        &mut self,
        from: Option<Handle>,
        steps: &[Step],
        mode: RemoveMode,
    ) -> Result<Option<Removed>> {
        let Some((last, parents)) = steps.split_last() else {
            return Err(Error::CannotRemoveRoot);
        };

        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        let start = state.resolve(from)?;
        let Some(parent) = state.walk(start, parents) else {
            return Ok(None);
        };
        let Some(child) = state.child(parent, last) else {
            return Ok(None);
        };

        match mode {
            RemoveMode::Shallow => {
                state.detach(parent, last);
                let handle = state.handle(child);
                state.registry.register_owned(handle);
                state.counters.shallow_removals += 1;
                tracing::debug!(
                    document = state.id.as_u64(),
                    step = %last,
                    "shallow-removed subtree"
                );
                Ok(Some(Removed::Shallow(handle)))
            }
            RemoveMode::Deep => {
                let target = Document::with_config(state.config.clone());
                {
                    let mut target_state = target.inner.borrow_mut();
                    let root =
                        copy_subtree(&state.arena, &state.buffer, child, &mut target_state.arena)?;
                    target_state.root = Some(root);
                    target_state.register(root, false);
                }

                state.detach(parent, last);
                let forgotten = state.forget_subtree(child);
                state.counters.deep_removals += 1;
                tracing::debug!(
                    document = state.id.as_u64(),
                    target = target.id().as_u64(),
                    forgotten,
                    step = %last,
                    "deep-removed subtree"
                );
                Ok(Some(Removed::Deep(target)))
            }
        }
    }

    /// Remove a subtree into a new document
    pub fn remove_deep(&mut self, from: Option<Handle>, steps: &[Step]) -> Result<Option<Document>> {
        Ok(self
            .remove(from, steps, RemoveMode::Deep)?
            .and_then(Removed::into_document))
    }

    /// Detach a subtree, keeping it readable through the returned handle
    pub fn remove_shallow(
        &mut self,
        from: Option<Handle>,
        steps: &[Step],
    ) -> Result<Option<Handle>> {
        Ok(self
            .remove(from, steps, RemoveMode::Shallow)?
            .and_then(|removed| removed.handle()))
    }
}
