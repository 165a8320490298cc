//! Compact JSON encoding of arena subtrees

use std::io;

use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::memory::NodeArena;
use crate::tree::{Node, NodeId};
use crate::{Error, Result};

/// Largest magnitude at which every integer is exactly representable
pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

/// Borrowed view of one node, serializable with any serde serializer
pub(crate) struct NodeView<'a> {
    arena: &'a NodeArena,
    buffer: &'a str,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    pub(crate) fn new(arena: &'a NodeArena, buffer: &'a str, id: NodeId) -> Self {
        Self { arena, buffer, id }
    }

    fn child(&self, id: NodeId) -> Self {
        Self::new(self.arena, self.buffer, id)
    }
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let Some(node) = self.arena.get(self.id) else {
            return Err(ser::Error::custom("node has been released"));
        };
        match node {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Node::String(s) => serializer.serialize_str(s.resolve(self.buffer)),
            Node::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.child(*item))?;
                }
                seq.end()
            }
            Node::Object(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for member in members {
                    map.serialize_entry(
                        member.name.resolve(self.buffer),
                        &self.child(member.value),
                    )?;
                }
                map.end()
            }
        }
    }
}

/// Encode a subtree as compact JSON text
pub(crate) fn to_string(view: &NodeView<'_>) -> Result<String> {
    serde_json::to_string(view).map_err(|e| Error::Io(e.to_string()))
}

/// Encode a subtree as compact JSON into `writer`
pub(crate) fn to_writer<W: io::Write>(view: &NodeView<'_>, writer: W) -> Result<()> {
    serde_json::to_writer(writer, view).map_err(|e| Error::Io(e.to_string()))
}
