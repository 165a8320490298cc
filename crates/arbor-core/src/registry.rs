//! Handle registry: the single authority on handle validity
//!
//! A handle is an address triple (document, arena generation, slot). The
//! registry records every handle given to the host together with an `owned`
//! flag. Validity is registry membership and nothing else; a handle is never
//! dereferenced before the registry has vouched for it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::tree::NodeId;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique document identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Opaque reference to a node, meaningful only to the document that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    document: DocumentId,
    generation: u32,
    node: NodeId,
}

impl Handle {
    pub(crate) fn new(document: DocumentId, generation: u32, node: NodeId) -> Self {
        Self {
            document,
            generation,
            node,
        }
    }

    /// Document that issued this handle
    pub fn document_id(&self) -> DocumentId {
        self.document
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }
}

/// Registered handles and their ownership flags
#[derive(Debug, Default)]
pub(crate) struct HandleRegistry {
    entries: HashMap<Handle, bool, ahash::RandomState>,
}

impl HandleRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a handle; an existing entry keeps its ownership flag
    pub(crate) fn register(&mut self, handle: Handle, owned: bool) {
        self.entries.entry(handle).or_insert(owned);
    }

    /// Record a handle as independently owned, overriding any prior flag
    pub(crate) fn register_owned(&mut self, handle: Handle) {
        self.entries.insert(handle, true);
    }

    pub(crate) fn is_valid(&self, handle: &Handle) -> bool {
        self.entries.contains_key(handle)
    }

    /// Forget a handle, returning its ownership flag if it was registered
    pub(crate) fn unregister(&mut self, handle: &Handle) -> Option<bool> {
        self.entries.remove(handle)
    }

    /// Clear every `owned` flag and return the handles that carried one; the
    /// caller destroys those nodes before the registry is cleared
    pub(crate) fn take_owned(&mut self) -> Vec<Handle> {
        let mut owned = Vec::new();
        for (handle, flag) in self.entries.iter_mut() {
            if *flag {
                *flag = false;
                owned.push(*handle);
            }
        }
        owned
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn owned_count(&self) -> usize {
        self.entries.values().filter(|owned| **owned).count()
    }
}
