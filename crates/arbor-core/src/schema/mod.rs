//! JSON Schema compilation and validation
//!
//! A [`SchemaDocument`] is compiled once and can then validate values from
//! any number of documents. It holds no reference to the documents it
//! validates, and a [`ValidationFailure`] holds no reference to either side.
//!
//! Supported: draft-4 through draft-7 validation keywords (`type`, `enum`,
//! `const`, numeric and string limits, `pattern`, array and object keywords,
//! `allOf`/`anyOf`/`oneOf`/`not`), boolean schemas and local `$ref`.
//! Unknown keywords are ignored.

mod compile;
mod validator;

use arbor_json_domain::ValidationFailure;
use serde_json::{Map, Number, Value};

use crate::document::Document;
use crate::memory::NodeArena;
use crate::parser::{self, MAX_SAFE_INTEGER, StringStorage, Trailing};
use crate::registry::Handle;
use crate::tree::{Node, NodeId};
use crate::{Error, Result};

use compile::{CompiledSchema, Compiler, SchemaId};
use validator::Validator;

/// A compiled, read-only JSON Schema
///
/// # Examples
/// ```
/// use arbor_json::{Document, SchemaDocument, Validation};
///
/// let schema = SchemaDocument::compile(r#"{"properties":{"a":{"type":"string"}}}"#)?;
/// let doc = Document::from_json(r#"{"a":1}"#, true)?;
/// let Validation::Invalid(failure) = doc.validate(None, &schema)? else {
///     panic!("expected a failure");
/// };
/// assert_eq!(failure.instance_pointer.to_uri_fragment(), "#/a");
/// # Ok::<(), arbor_json::Error>(())
/// ```
#[derive(Debug)]
pub struct SchemaDocument {
    nodes: Vec<CompiledSchema>,
    root: SchemaId,
}

impl SchemaDocument {
    /// Compile schema text
    ///
    /// Malformed JSON is reported with the offset where decoding stopped;
    /// malformed keyword values are reported with offset zero and the schema
    /// location in the message.
    pub fn compile(text: impl AsRef<[u8]>) -> Result<Self> {
        let value = decode_schema(text.as_ref()).map_err(|err| match err {
            Error::Parse { offset, message } => Error::SchemaCompile { offset, message },
            other => other,
        })?;
        Self::from_value(&value)
    }

    /// Compile an already decoded schema
    pub fn from_value(value: &Value) -> Result<Self> {
        let (nodes, root) = Compiler::new(value).finish()?;
        tracing::debug!(nodes = nodes.len(), "compiled schema");
        Ok(Self { nodes, root })
    }

    /// Number of compiled schema nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the schema compiled to no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn decode_schema(text: &[u8]) -> Result<Value> {
    let (text, _) = parser::input_text(text, true)?;
    let mut arena = NodeArena::new(0, None);
    let root = parser::decode(&text, &mut arena, StringStorage::Owned, Trailing::Reject)?;
    schema_value(&arena, root)
}

/// Build the `Value` a schema is compiled from
///
/// Member lookup in a schema follows the document rule: of duplicated
/// member names, the first one counts.
fn schema_value(arena: &NodeArena, id: NodeId) -> Result<Value> {
    let node = arena
        .get(id)
        .ok_or_else(|| Error::schema_compile(0, "schema node has been released"))?;
    Ok(match node {
        Node::Null => Value::Null,
        Node::Bool(b) => Value::Bool(*b),
        Node::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => Value::from(*n as i64),
        Node::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        Node::String(s) => Value::String(s.resolve("").to_owned()),
        Node::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| schema_value(arena, *item))
                .collect::<Result<_>>()?,
        ),
        Node::Object(members) => {
            let mut map = Map::with_capacity(members.len());
            for member in members {
                let name = member.name.resolve("");
                if !map.contains_key(name) {
                    map.insert(name.to_owned(), schema_value(arena, member.value)?);
                }
            }
            Value::Object(map)
        }
    })
}

/// Result of validating a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The value satisfies the schema
    Valid,
    /// The first failing constraint
    Invalid(ValidationFailure),
}

impl Validation {
    /// Whether the value satisfied the schema
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// The failure, if any
    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(failure) => Some(failure),
        }
    }

    /// Convert a failure into [`Error::Validation`]
    pub fn into_result(self) -> Result<()> {
        match self {
            Validation::Valid => Ok(()),
            Validation::Invalid(failure) => Err(failure.into()),
        }
    }
}

impl Document {
    /// Validate the value at `from` (the root when `None`) against `schema`
    pub fn validate(&self, from: Option<Handle>, schema: &SchemaDocument) -> Result<Validation> {
        let state = self.inner.borrow();
        let node = state.resolve(from)?;
        let validator = Validator::new(
            &schema.nodes,
            &state.arena,
            &state.buffer,
            state.config.limits.max_validation_depth,
        );
        match validator.validate(schema.root, node) {
            Ok(()) => Ok(Validation::Valid),
            Err(failure) => {
                tracing::trace!(%failure, "validation failed");
                Ok(Validation::Invalid(failure))
            }
        }
    }
}
