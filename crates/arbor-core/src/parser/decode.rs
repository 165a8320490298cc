//! Arena-building decoder driven by `serde_json`
//!
//! The decoder never materializes an intermediate value: a
//! [`DeserializeSeed`] carrying the tree builder allocates each node as soon
//! as its children are complete, so a failure part way through leaves only
//! arena slots behind, which the caller discards with a reset.

use std::fmt;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use crate::memory::NodeArena;
use crate::tree::{JsonStr, Member, Node, NodeId};
use crate::{Error, Result};

const TRAILING_CONTENT: &str = "The document root must not be followed by other values.";

/// Where decoded string bytes live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringStorage {
    /// Every string owns a copy of its bytes
    Owned,
    /// Strings without escapes are spans of the decoded text
    Spans,
}

/// What follows the root value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trailing {
    /// Only whitespace may follow the root
    Reject,
    /// Decoding stops after the root; the rest is ignored
    Ignore,
}

struct TreeBuilder<'a> {
    arena: &'a mut NodeArena,
    storage: StringStorage,
    base: usize,
    len: usize,
    failure: Option<Error>,
}

impl<'a> TreeBuilder<'a> {
    fn new(arena: &'a mut NodeArena, text: &str, storage: StringStorage) -> Self {
        Self {
            arena,
            storage,
            base: text.as_ptr() as usize,
            len: text.len(),
            failure: None,
        }
    }

    fn alloc<E: de::Error>(&mut self, node: Node) -> std::result::Result<NodeId, E> {
        self.arena.alloc(node).map_err(|err| {
            let message = err.to_string();
            self.failure = Some(err);
            E::custom(message)
        })
    }

    /// Span of the decoded text when `value` points into it, owned otherwise
    fn borrowed(&self, value: &str) -> JsonStr {
        if self.storage == StringStorage::Spans {
            let start = (value.as_ptr() as usize).wrapping_sub(self.base);
            if start <= self.len && value.len() <= self.len - start {
                return JsonStr::Span {
                    start,
                    end: start + value.len(),
                };
            }
        }
        JsonStr::Owned(value.into())
    }
}

struct NodeSeed<'b, 'a> {
    builder: &'b mut TreeBuilder<'a>,
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_, '_> {
    type Value = NodeId;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<NodeId, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NodeSeed<'_, '_> {
    type Value = NodeId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<NodeId, E> {
        self.builder.alloc(Node::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<NodeId, E> {
        self.builder.alloc(Node::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<NodeId, E> {
        self.builder.alloc(Node::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<NodeId, E> {
        self.builder.alloc(Node::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<NodeId, E> {
        self.builder.alloc(Node::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<NodeId, E> {
        self.builder.alloc(Node::String(JsonStr::Owned(v.into())))
    }

    fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> std::result::Result<NodeId, E> {
        let s = self.builder.borrowed(v);
        self.builder.alloc(Node::String(s))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<NodeId, E> {
        self.builder
            .alloc(Node::String(JsonStr::Owned(v.into_boxed_str())))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<NodeId, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let builder = self.builder;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(id) = seq.next_element_seed(NodeSeed {
            builder: &mut *builder,
        })? {
            items.push(id);
        }
        items.shrink_to_fit();
        builder.alloc(Node::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<NodeId, A::Error>
    where
        A: MapAccess<'de>,
    {
        let builder = self.builder;
        let mut members = Vec::new();
        while let Some(name) = map.next_key_seed(KeySeed { builder: &*builder })? {
            let value = map.next_value_seed(NodeSeed {
                builder: &mut *builder,
            })?;
            members.push(Member { name, value });
        }
        members.shrink_to_fit();
        builder.alloc(Node::Object(members))
    }
}

struct KeySeed<'b, 'a> {
    builder: &'b TreeBuilder<'a>,
}

impl<'de> DeserializeSeed<'de> for KeySeed<'_, '_> {
    type Value = JsonStr;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<JsonStr, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Visitor<'de> for KeySeed<'_, '_> {
    type Value = JsonStr;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object member name")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<JsonStr, E> {
        Ok(JsonStr::Owned(v.into()))
    }

    fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> std::result::Result<JsonStr, E> {
        Ok(self.builder.borrowed(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<JsonStr, E> {
        Ok(JsonStr::Owned(v.into_boxed_str()))
    }
}

/// Decode `text` into `arena`, returning the root node
pub(crate) fn decode(
    text: &str,
    arena: &mut NodeArena,
    storage: StringStorage,
    trailing: Trailing,
) -> Result<NodeId> {
    let mut builder = TreeBuilder::new(arena, text, storage);
    let mut deserializer = serde_json::Deserializer::from_str(text);

    let root = match (NodeSeed {
        builder: &mut builder,
    })
    .deserialize(&mut deserializer)
    {
        Ok(root) => root,
        Err(err) => {
            return Err(builder
                .failure
                .take()
                .unwrap_or_else(|| parse_error(text, &err)));
        }
    };

    if trailing == Trailing::Reject {
        deserializer
            .end()
            .map_err(|err| Error::parse(error_offset(text, &err), TRAILING_CONTENT))?;
    }
    Ok(root)
}

fn parse_error(text: &str, err: &serde_json::Error) -> Error {
    let message = err.to_string();
    let message = match message.find(" at line ") {
        Some(pos) => &message[..pos],
        None => message.as_str(),
    };
    Error::parse(error_offset(text, err), message)
}

/// Byte offset of the character a `serde_json` error points at
fn error_offset(text: &str, err: &serde_json::Error) -> usize {
    let line_start = if err.line() <= 1 {
        0
    } else {
        text.match_indices('\n')
            .nth(err.line() - 2)
            .map_or(text.len(), |(i, _)| i + 1)
    };
    (line_start + err.column().saturating_sub(1)).min(text.len())
}
