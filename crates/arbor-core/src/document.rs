//! Document lifecycle and the read surface exposed to hosts
//!
//! A [`Document`] owns one arena, one handle registry and one reusable decode
//! buffer. Hosts only ever see [`Handle`]s; every operation re-validates the
//! handle through the registry before touching the tree.
//!
//! Teardown (on re-parse, reset, [`Document::destroy`] and drop) always runs in
//! the same order: destroy shallow-extracted orphans, reset the arena in bulk,
//! clear the registry.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use arbor_json_domain::ValueType;

use crate::config::DocumentConfig;
use crate::memory::{ArenaStats, NodeArena};
use crate::parser::{self, NodeView, StringStorage, Trailing};
use crate::registry::{DocumentId, Handle, HandleRegistry};
use crate::tree::{Node, NodeId};
use crate::{Error, Result};

/// Scalar value read out of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// JSON `null`
    Null,
    /// JSON `true` / `false`
    Bool(bool),
    /// JSON number
    Number(f64),
    /// JSON string
    String(String),
}

/// Input for [`Document::reset_and_parse`]
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    /// Decoded in copy mode, see [`Document::parse`]
    Text(&'a [u8]),
    /// Decoded in place, see [`Document::parse_in_place`]
    Buffer(&'a [u8]),
}

/// Document counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    /// Arena usage
    pub arena: ArenaStats,
    /// Handles currently registered
    pub registered_handles: usize,
    /// Shallow-extracted nodes awaiting teardown
    pub pending_orphans: usize,
    /// Shallow-extracted nodes destroyed by teardown so far
    pub orphans_released: usize,
    /// Successful parses
    pub parses: usize,
    /// Deep removals performed
    pub deep_removals: usize,
    /// Shallow removals performed
    pub shallow_removals: usize,
    /// Capacity of the in-place decode buffer
    pub buffer_capacity: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub parses: usize,
    pub orphans_released: usize,
    pub deep_removals: usize,
    pub shallow_removals: usize,
}

/// Shared document state; iterators reach it through a `Weak`
#[derive(Debug)]
pub(crate) struct DocumentState {
    pub id: DocumentId,
    pub config: DocumentConfig,
    pub arena: NodeArena,
    pub registry: HandleRegistry,
    pub root: Option<NodeId>,
    pub buffer: String,
    pub counters: Counters,
}

impl DocumentState {
    fn new(config: DocumentConfig) -> Self {
        let arena = NodeArena::new(config.limits.initial_arena_capacity, config.quota.clone());
        Self {
            id: DocumentId::next(),
            config,
            arena,
            registry: HandleRegistry::new(),
            root: None,
            buffer: String::new(),
            counters: Counters::default(),
        }
    }

    pub(crate) fn handle(&self, node: NodeId) -> Handle {
        Handle::new(self.id, self.arena.generation(), node)
    }

    /// Register `node` and return its handle
    pub(crate) fn register(&mut self, node: NodeId, owned: bool) -> Handle {
        let handle = self.handle(node);
        self.registry.register(handle, owned);
        handle
    }

    /// Node named by `from`, or the root when `from` is `None`
    pub(crate) fn resolve(&self, from: Option<Handle>) -> Result<NodeId> {
        match from {
            Some(handle) if self.registry.is_valid(&handle) => Ok(handle.node()),
            Some(_) => Err(Error::InvalidHandle),
            None => self.root.ok_or(Error::InvalidHandle),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.arena.get(id).ok_or(Error::InvalidHandle)
    }

    fn resolve_node(&self, from: Option<Handle>) -> Result<&Node> {
        self.node(self.resolve(from)?)
    }

    /// Destroy orphans, reset the arena, clear the registry
    pub(crate) fn teardown(&mut self) {
        let orphans = self.registry.take_owned();
        for orphan in &orphans {
            self.arena.release(orphan.node());
        }
        self.counters.orphans_released += orphans.len();
        if !orphans.is_empty() {
            tracing::debug!(
                document = self.id.as_u64(),
                orphans = orphans.len(),
                "released shallow-extracted nodes"
            );
        }

        self.arena.reset();
        self.registry.clear();
        self.root = None;
    }

    fn finish_parse(&mut self, root: Result<NodeId>) -> Result<Handle> {
        match root {
            Ok(root) => {
                self.root = Some(root);
                self.counters.parses += 1;
                tracing::debug!(
                    document = self.id.as_u64(),
                    nodes = self.arena.stats().live_nodes,
                    "parsed document"
                );
                Ok(self.register(root, false))
            }
            Err(err) => {
                // drop partially built nodes and return their quota
                self.arena.reset();
                tracing::debug!(document = self.id.as_u64(), error = %err, "parse failed");
                Err(err)
            }
        }
    }

    pub(crate) fn stats(&self) -> DocumentStats {
        DocumentStats {
            arena: self.arena.stats(),
            registered_handles: self.registry.len(),
            pending_orphans: self.registry.owned_count(),
            orphans_released: self.counters.orphans_released,
            parses: self.counters.parses,
            deep_removals: self.counters.deep_removals,
            shallow_removals: self.counters.shallow_removals,
            buffer_capacity: self.buffer.capacity(),
        }
    }
}

/// A JSON document: arena-owned tree, handle registry and decode buffer
///
/// `Document` is `!Send`: one document belongs to one host
/// thread.
///
/// # Examples
/// ```
/// use arbor_json::{Document, Scalar, path};
///
/// let doc = Document::from_json(r#"{"a":{"b":[10,20]}}"#, true)?;
/// let item = doc.find(None, &path!["a", "b", 1])?.expect("present");
/// assert_eq!(doc.value(Some(item))?, Scalar::Number(20.0));
/// # Ok::<(), arbor_json::Error>(())
/// ```
#[derive(Debug)]
pub struct Document {
    pub(crate) inner: Rc<RefCell<DocumentState>>,
}

impl Document {
    /// Create an empty document with default configuration
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Create an empty document
    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocumentState::new(config))),
        }
    }

    /// Create a document and parse `text` into it in copy mode
    pub fn from_json(text: impl AsRef<[u8]>, validate_encoding: bool) -> Result<Self> {
        let mut doc = Self::new();
        doc.parse(text, validate_encoding)?;
        Ok(doc)
    }

    /// Decode `text` into a fresh tree, replacing any current tree
    ///
    /// Strings own their bytes and the input is never retained. Only
    /// whitespace may follow the root value.
    pub fn parse(&mut self, text: impl AsRef<[u8]>, validate_encoding: bool) -> Result<Handle> {
        let mut state = self.inner.borrow_mut();
        state.teardown();
        let (text, offsets) = parser::input_text(text.as_ref(), validate_encoding)?;
        let root = parser::decode(&text, &mut state.arena, StringStorage::Owned, Trailing::Reject)
            .map_err(|err| offsets.input_error(err));
        state.finish_parse(root)
    }

    /// Decode `input` through the document's reusable buffer, replacing any
    /// current tree
    ///
    /// Compressed input recognized by the configured decompressor is inflated
    /// first. Decoding stops after the first complete value; trailing bytes
    /// are ignored.
    pub fn parse_in_place(&mut self, input: &[u8], validate_encoding: bool) -> Result<Handle> {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        state.teardown();
        let offsets = parser::load_buffer(
            &mut state.buffer,
            input,
            state.config.decompressor.as_deref(),
            state.config.limits.max_decompressed_size,
            validate_encoding,
        )?;
        let root = parser::decode(
            &state.buffer,
            &mut state.arena,
            StringStorage::Spans,
            Trailing::Ignore,
        )
        .map_err(|err| offsets.input_error(err));
        state.finish_parse(root)
    }

    /// Invalidate every handle and decode new input into the same document
    pub fn reset_and_parse(&mut self, input: Input<'_>, validate_encoding: bool) -> Result<Handle> {
        tracing::trace!(document = self.id().as_u64(), "resetting document");
        match input {
            Input::Text(text) => self.parse(text, validate_encoding),
            Input::Buffer(bytes) => self.parse_in_place(bytes, validate_encoding),
        }
    }

    /// Tear the document down and return its final counters
    pub fn destroy(self) -> DocumentStats {
        let mut state = self.inner.borrow_mut();
        state.teardown();
        state.stats()
    }

    /// Identity of this document
    pub fn id(&self) -> DocumentId {
        self.inner.borrow().id
    }

    /// Handle of the root value, if a tree is present
    pub fn root(&self) -> Option<Handle> {
        let state = self.inner.borrow();
        state.root.map(|root| state.handle(root))
    }

    /// Whether `handle` is currently registered with this document
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.inner.borrow().registry.is_valid(&handle)
    }

    /// Current counters
    pub fn stats(&self) -> DocumentStats {
        self.inner.borrow().stats()
    }

    /// Configuration the document was created with
    pub fn config(&self) -> DocumentConfig {
        self.inner.borrow().config.clone()
    }

    /// Type of the value at `from` (the root when `None`)
    pub fn value_type(&self, from: Option<Handle>) -> Result<ValueType> {
        Ok(self.inner.borrow().resolve_node(from)?.value_type())
    }

    /// String byte length, member count or element count
    pub fn size(&self, from: Option<Handle>) -> Result<usize> {
        let state = self.inner.borrow();
        match state.resolve_node(from)? {
            Node::String(s) => Ok(s.resolve(&state.buffer).len()),
            Node::Array(items) => Ok(items.len()),
            Node::Object(members) => Ok(members.len()),
            Node::Number(_) => Err(Error::type_mismatch("attempt to get length of a number")),
            Node::Bool(_) => Err(Error::type_mismatch("attempt to get length of a boolean")),
            Node::Null => Err(Error::type_mismatch("attempt to get length of a NULL")),
        }
    }

    /// Scalar value at `from`
    pub fn value(&self, from: Option<Handle>) -> Result<Scalar> {
        let state = self.inner.borrow();
        match state.resolve_node(from)? {
            Node::Null => Ok(Scalar::Null),
            Node::Bool(b) => Ok(Scalar::Bool(*b)),
            Node::Number(n) => Ok(Scalar::Number(*n)),
            Node::String(s) => Ok(Scalar::String(s.resolve(&state.buffer).to_owned())),
            Node::Array(_) => Err(Error::type_mismatch("value() not allowed on an array")),
            Node::Object(_) => Err(Error::type_mismatch("value() not allowed on an object")),
        }
    }

    /// Compact JSON text of the value at `from`
    pub fn serialize(&self, from: Option<Handle>) -> Result<String> {
        let state = self.inner.borrow();
        let id = state.resolve(from)?;
        parser::to_string(&NodeView::new(&state.arena, &state.buffer, id))
    }

    /// Write compact JSON text of the value at `from` into `writer`
    pub fn write_to<W: io::Write>(&self, from: Option<Handle>, writer: W) -> Result<()> {
        let state = self.inner.borrow();
        let id = state.resolve(from)?;
        parser::to_writer(&NodeView::new(&state.arena, &state.buffer, id), writer)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.try_borrow_mut() {
            state.teardown();
        }
    }
}
