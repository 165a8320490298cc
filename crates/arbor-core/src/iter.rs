//! Container iterators
//!
//! Iterators do not borrow the document. They hold a weak reference to its
//! state plus the container's handle, and re-check that handle before every
//! step, so the document may be mutated, reset or dropped while an iterator
//! is alive. A step on an invalidated iterator yields
//! [`Error::IteratorInvalidated`] once; the iterator is fused afterwards.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use arbor_json_domain::Step;

use crate::document::{Document, DocumentState};
use crate::registry::Handle;
use crate::tree::{Node, NodeId};
use crate::{Error, Result};

#[derive(Debug)]
struct Cursor {
    state: Weak<RefCell<DocumentState>>,
    container: Handle,
    position: usize,
    end: usize,
    done: bool,
}

impl Cursor {
    fn new(state: &Rc<RefCell<DocumentState>>, container: Handle, end: usize) -> Self {
        Self {
            state: Rc::downgrade(state),
            container,
            position: 0,
            end,
            done: false,
        }
    }

    /// Run `step` against the live state, or report invalidation
    fn advance<T>(
        &mut self,
        step: impl FnOnce(&mut DocumentState, NodeId, usize) -> Option<Result<T>>,
    ) -> Option<Result<T>> {
        if self.done {
            return None;
        }
        let Some(state) = self.state.upgrade() else {
            return self.invalidated();
        };
        let mut state = state.borrow_mut();
        if !state.registry.is_valid(&self.container) {
            return self.invalidated();
        }
        if self.position >= self.end {
            self.done = true;
            return None;
        }
        let item = step(&mut state, self.container.node(), self.position);
        match &item {
            Some(Err(_)) | None => self.done = true,
            Some(Ok(_)) => self.position += 1,
        }
        item
    }

    fn invalidated<T>(&mut self) -> Option<Result<T>> {
        self.done = true;
        tracing::trace!("iterator invalidated");
        Some(Err(Error::IteratorInvalidated))
    }
}

/// Iterator over object members in insertion order
#[derive(Debug)]
pub struct ObjectIter {
    cursor: Cursor,
}

impl Iterator for ObjectIter {
    type Item = Result<(String, Handle)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.advance(|state, container, position| {
            let (name, child) = match state.arena.get(container) {
                Some(Node::Object(members)) => {
                    let member = members.get(position)?;
                    (member.name.resolve(&state.buffer).to_owned(), member.value)
                }
                _ => return Some(Err(Error::IteratorInvalidated)),
            };
            Some(Ok((name, state.register(child, false))))
        })
    }
}

/// Iterator over array elements in ascending index order
#[derive(Debug)]
pub struct ArrayIter {
    cursor: Cursor,
}

impl Iterator for ArrayIter {
    type Item = Result<(usize, Handle)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.advance(|state, container, position| {
            let child = match state.arena.get(container) {
                Some(Node::Array(items)) => *items.get(position)?,
                _ => return Some(Err(Error::IteratorInvalidated)),
            };
            Some(Ok((position, state.register(child, false))))
        })
    }
}

/// Iterator over either kind of container, yielding the step that reaches
/// each child
#[derive(Debug)]
pub enum ContainerIter {
    /// Object members
    Object(ObjectIter),
    /// Array elements
    Array(ArrayIter),
}

impl Iterator for ContainerIter {
    type Item = Result<(Step, Handle)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ContainerIter::Object(iter) => iter
                .next()
                .map(|item| item.map(|(name, handle)| (Step::Key(name), handle))),
            ContainerIter::Array(iter) => iter
                .next()
                .map(|item| item.map(|(index, handle)| (Step::Index(index), handle))),
        }
    }
}

impl Document {
    /// Iterate the members of the object at `from`
    pub fn members(&self, from: Option<Handle>) -> Result<ObjectIter> {
        match self.iter(from)? {
            ContainerIter::Object(iter) => Ok(iter),
            ContainerIter::Array(_) => Err(Error::type_mismatch(
                "members() not allowed on an array",
            )),
        }
    }

    /// Iterate the elements of the array at `from`
    pub fn elements(&self, from: Option<Handle>) -> Result<ArrayIter> {
        match self.iter(from)? {
            ContainerIter::Array(iter) => Ok(iter),
            ContainerIter::Object(_) => Err(Error::type_mismatch(
                "elements() not allowed on an object",
            )),
        }
    }

    /// Iterate the container at `from`, whichever kind it is
    pub fn iter(&self, from: Option<Handle>) -> Result<ContainerIter> {
        let mut state = self.inner.borrow_mut();
        let id = state.resolve(from)?;
        let container = state.register(id, false);
        match state.node(id)? {
            Node::Object(members) => Ok(ContainerIter::Object(ObjectIter {
                cursor: Cursor::new(&self.inner, container, members.len()),
            })),
            Node::Array(items) => Ok(ContainerIter::Array(ArrayIter {
                cursor: Cursor::new(&self.inner, container, items.len()),
            })),
            _ => Err(Error::type_mismatch("iter() not allowed on a primitive type")),
        }
    }
}
