//! Value tree nodes stored in a document arena
//!
//! Nodes reference their children by [`NodeId`], an index into the owning
//! arena. A parent owns its children: releasing a node releases its subtree.

use arbor_json_domain::ValueType;

/// Slot index inside one arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(NodeId)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// String payload: owned bytes, or a span of the document's decode buffer
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JsonStr {
    Owned(Box<str>),
    Span { start: usize, end: usize },
}

impl JsonStr {
    /// Resolve against the decode buffer that was current when the span was
    /// created
    pub(crate) fn resolve<'a>(&'a self, buffer: &'a str) -> &'a str {
        match self {
            JsonStr::Owned(s) => s,
            JsonStr::Span { start, end } => buffer.get(*start..*end).unwrap_or_default(),
        }
    }

    fn heap_bytes(&self) -> usize {
        match self {
            JsonStr::Owned(s) => s.len(),
            JsonStr::Span { .. } => 0,
        }
    }
}

/// Object member
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Member {
    pub name: JsonStr,
    pub value: NodeId,
}

/// A value in the tree
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Null,
    Bool(bool),
    Number(f64),
    String(JsonStr),
    Array(Vec<NodeId>),
    Object(Vec<Member>),
}

impl Node {
    pub(crate) fn value_type(&self) -> ValueType {
        match self {
            Node::Null => ValueType::Null,
            Node::Bool(_) => ValueType::Boolean,
            Node::Number(_) => ValueType::Number,
            Node::String(_) => ValueType::String,
            Node::Array(_) => ValueType::Array,
            Node::Object(_) => ValueType::Object,
        }
    }

    /// Bytes owned outside the slot itself, charged to the quota
    pub(crate) fn heap_bytes(&self) -> usize {
        match self {
            Node::String(s) => s.heap_bytes(),
            Node::Array(items) => items.capacity() * std::mem::size_of::<NodeId>(),
            Node::Object(members) => {
                members.capacity() * std::mem::size_of::<Member>()
                    + members.iter().map(|m| m.name.heap_bytes()).sum::<usize>()
            }
            Node::Null | Node::Bool(_) | Node::Number(_) => 0,
        }
    }

    /// Direct children in document order
    pub(crate) fn children(&self) -> Box<dyn Iterator<Item = NodeId> + '_> {
        match self {
            Node::Array(items) => Box::new(items.iter().copied()),
            Node::Object(members) => Box::new(members.iter().map(|m| m.value)),
            _ => Box::new(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_resolution() {
        let buffer = r#"{"name":"arbor"}"#;
        let span = JsonStr::Span { start: 9, end: 14 };
        assert_eq!(span.resolve(buffer), "arbor");

        let owned = JsonStr::Owned("x".into());
        assert_eq!(owned.resolve(buffer), "x");
    }

    #[test]
    fn test_span_out_of_range_resolves_empty() {
        let span = JsonStr::Span { start: 4, end: 40 };
        assert_eq!(span.resolve("abc"), "");
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Node::Null.value_type(), ValueType::Null);
        assert_eq!(Node::Number(1.0).value_type(), ValueType::Number);
        assert_eq!(Node::Array(vec![]).value_type(), ValueType::Array);
    }

    #[test]
    fn test_children_order() {
        let a = NodeId::from_index(1).unwrap();
        let b = NodeId::from_index(2).unwrap();
        let node = Node::Object(vec![
            Member {
                name: JsonStr::Owned("a".into()),
                value: a,
            },
            Member {
                name: JsonStr::Owned("b".into()),
                value: b,
            },
        ]);
        assert_eq!(node.children().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(Node::Bool(true).children().count(), 0);
    }
}
