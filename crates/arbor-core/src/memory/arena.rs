//! Append-only node arena with bulk reset
//!
//! Slots are handed out in order and never reused until [`NodeArena::reset`].
//! A reset drops every node at once, keeps the slot vector's capacity for the
//! next document, and advances the arena generation so that an address from
//! before the reset can never name a node allocated after it.

use std::mem;

use smallvec::{SmallVec, smallvec};

use crate::memory::MemoryQuota;
use crate::tree::{Node, NodeId};
use crate::{Error, Result};

const SLOT_BYTES: usize = mem::size_of::<Option<Node>>();

/// Arena usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Nodes currently alive
    pub live_nodes: usize,
    /// Slots handed out since the last reset, alive or released
    pub allocated_slots: usize,
    /// Slot capacity retained across resets
    pub slot_capacity: usize,
    /// Bytes currently charged to the quota (tracked even without a quota)
    pub charged_bytes: usize,
    /// Current generation
    pub generation: u32,
}

/// Node storage for one document
#[derive(Debug)]
pub(crate) struct NodeArena {
    slots: Vec<Option<Node>>,
    generation: u32,
    quota: Option<MemoryQuota>,
    charged: usize,
    live: usize,
}

impl NodeArena {
    pub(crate) fn new(capacity: usize, quota: Option<MemoryQuota>) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            generation: 0,
            quota,
            charged: 0,
            live: 0,
        }
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }

    /// Store a node, charging its slot and heap bytes to the quota
    pub(crate) fn alloc(&mut self, node: Node) -> Result<NodeId> {
        let id = NodeId::from_index(self.slots.len())
            .ok_or_else(|| Error::memory("arena slot index overflow"))?;
        let bytes = SLOT_BYTES + node.heap_bytes();
        if let Some(quota) = &self.quota {
            quota.try_charge(bytes)?;
        }
        self.charged += bytes;
        self.live += 1;
        self.slots.push(Some(node));
        Ok(id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Drop a node and everything below it, returning the released node count
    pub(crate) fn release(&mut self, id: NodeId) -> usize {
        let mut released = 0;
        let mut stack: SmallVec<[NodeId; 32]> = smallvec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.slots.get_mut(next.index()).and_then(Option::take) else {
                continue;
            };
            stack.extend(node.children());
            self.refund(SLOT_BYTES + node.heap_bytes());
            self.live -= 1;
            released += 1;
        }
        released
    }

    /// Drop every node at once and start a new generation
    pub(crate) fn reset(&mut self) {
        self.slots.clear();
        let charged = mem::take(&mut self.charged);
        if let Some(quota) = &self.quota {
            quota.refund(charged);
        }
        self.live = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn stats(&self) -> ArenaStats {
        ArenaStats {
            live_nodes: self.live,
            allocated_slots: self.slots.len(),
            slot_capacity: self.slots.capacity(),
            charged_bytes: self.charged,
            generation: self.generation,
        }
    }

    fn refund(&mut self, bytes: usize) {
        let bytes = bytes.min(self.charged);
        self.charged -= bytes;
        if let Some(quota) = &self.quota {
            quota.refund(bytes);
        }
    }
}

impl Drop for NodeArena {
    fn drop(&mut self) {
        if let Some(quota) = &self.quota {
            quota.refund(self.charged);
        }
    }
}
