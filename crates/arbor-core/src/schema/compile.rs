//! Schema compilation
//!
//! A schema document is flattened into a vector of compiled nodes addressed
//! by [`SchemaId`]. Every node remembers the JSON pointer it was compiled
//! from, which is what failures report. Nodes are memoized by pointer, so a
//! local `$ref` and the nested schema it names share one node, and recursive
//! references close into cycles instead of expanding forever.

use std::collections::{HashMap, HashSet};

use arbor_json_domain::{JsonPointer, SchemaKeyword};
use regex::Regex;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Index of a compiled schema node
pub(crate) type SchemaId = usize;

/// Set of accepted instance types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TypeSet(u8);

impl TypeSet {
    pub const NULL: u8 = 1;
    pub const BOOLEAN: u8 = 1 << 1;
    pub const INTEGER: u8 = 1 << 2;
    pub const NUMBER: u8 = 1 << 3;
    pub const STRING: u8 = 1 << 4;
    pub const ARRAY: u8 = 1 << 5;
    pub const OBJECT: u8 = 1 << 6;

    fn from_name(name: &str) -> Option<u8> {
        Some(match name {
            "null" => Self::NULL,
            "boolean" => Self::BOOLEAN,
            "integer" => Self::INTEGER,
            "number" => Self::NUMBER,
            "string" => Self::STRING,
            "array" => Self::ARRAY,
            "object" => Self::OBJECT,
            _ => return None,
        })
    }

    pub(crate) fn contains(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

/// `minimum` / `maximum`, with the draft-4 boolean exclusivity modifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Limit {
    pub value: f64,
    pub exclusive: bool,
}

#[derive(Debug)]
pub(crate) enum Items {
    /// One schema for every element
    Uniform(SchemaId),
    /// Positional schemas
    Tuple(Vec<SchemaId>),
}

/// Keyword constraints of one object schema
#[derive(Debug, Default)]
pub(crate) struct Keywords {
    pub types: Option<TypeSet>,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,

    pub multiple_of: Option<f64>,
    pub minimum: Option<Limit>,
    pub maximum: Option<Limit>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,

    pub items: Option<Items>,
    pub additional_items: Option<SchemaId>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,

    pub required: Vec<String>,
    pub properties: Vec<(String, SchemaId)>,
    pub pattern_properties: Vec<(Regex, SchemaId)>,
    pub additional_properties: Option<SchemaId>,
    pub min_properties: Option<usize>,
    pub max_properties: Option<usize>,

    pub all_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub not: Option<SchemaId>,
}

#[derive(Debug)]
pub(crate) enum SchemaKind {
    /// `true` or `{}`
    Always,
    /// `false`
    Never,
    /// Local reference, resolved at compile time
    Ref(SchemaId),
    Keywords(Box<Keywords>),
}

#[derive(Debug)]
pub(crate) struct CompiledSchema {
    pub pointer: JsonPointer,
    pub kind: SchemaKind,
}

fn keyword_error(pointer: &JsonPointer, keyword: SchemaKeyword, problem: &str) -> Error {
    Error::schema_compile(
        0,
        format!("{} at {}: {problem}", keyword.as_str(), pointer.to_uri_fragment()),
    )
}

pub(crate) struct Compiler<'v> {
    root: &'v Value,
    nodes: Vec<CompiledSchema>,
    by_pointer: HashMap<String, SchemaId, ahash::RandomState>,
}

impl<'v> Compiler<'v> {
    pub(crate) fn new(root: &'v Value) -> Self {
        Self {
            root,
            nodes: Vec::new(),
            by_pointer: HashMap::default(),
        }
    }

    /// Compile the whole document, returning the nodes and the root id
    pub(crate) fn finish(mut self) -> Result<(Vec<CompiledSchema>, SchemaId)> {
        let root = self.compile(self.root, JsonPointer::root())?;
        check_ref_cycles(&self.nodes)?;
        Ok((self.nodes, root))
    }

    fn compile(&mut self, value: &'v Value, pointer: JsonPointer) -> Result<SchemaId> {
        let key = pointer.to_string();
        if let Some(id) = self.by_pointer.get(&key) {
            return Ok(*id);
        }

        let id = self.nodes.len();
        self.nodes.push(CompiledSchema {
            pointer: pointer.clone(),
            kind: SchemaKind::Always,
        });
        self.by_pointer.insert(key, id);

        let kind = match value {
            Value::Bool(true) => SchemaKind::Always,
            Value::Bool(false) => SchemaKind::Never,
            Value::Object(map) => self.compile_object(map, &pointer)?,
            _ => {
                return Err(Error::schema_compile(
                    0,
                    format!(
                        "schema at {} must be an object or a boolean",
                        pointer.to_uri_fragment()
                    ),
                ));
            }
        };
        self.nodes[id].kind = kind;
        Ok(id)
    }

    fn compile_object(&mut self, map: &'v Map<String, Value>, pointer: &JsonPointer) -> Result<SchemaKind> {
        // siblings of $ref are ignored
        if let Some(reference) = map.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| keyword_error(pointer, SchemaKeyword::Ref, "must be a string"))?;
            return Ok(SchemaKind::Ref(self.resolve_ref(reference, pointer)?));
        }

        let mut k = Keywords::default();
        let mut constrained = false;
        for (name, value) in map {
            let keyword = match name.parse::<SchemaKeyword>() {
                Ok(SchemaKeyword::Ref | SchemaKeyword::False) | Err(_) => continue,
                Ok(keyword) => keyword,
            };
            constrained = true;
            self.compile_keyword(&mut k, keyword, value, map, pointer)?;
        }

        if constrained {
            Ok(SchemaKind::Keywords(Box::new(k)))
        } else {
            Ok(SchemaKind::Always)
        }
    }

    fn compile_keyword(
        &mut self,
        k: &mut Keywords,
        keyword: SchemaKeyword,
        value: &'v Value,
        map: &'v Map<String, Value>,
        pointer: &JsonPointer,
    ) -> Result<()> {
        let at = pointer.with_key(keyword.as_str());
        match keyword {
            SchemaKeyword::Type => k.types = Some(parse_types(value, pointer)?),
            SchemaKeyword::Enum => {
                let values = value
                    .as_array()
                    .filter(|values| !values.is_empty())
                    .ok_or_else(|| keyword_error(pointer, keyword, "must be a non-empty array"))?;
                k.enum_values = Some(values.clone());
            }
            SchemaKeyword::Const => k.const_value = Some(value.clone()),
            SchemaKeyword::MultipleOf => {
                let divisor = number(value, pointer, keyword)?;
                if divisor <= 0.0 {
                    return Err(keyword_error(pointer, keyword, "must be greater than zero"));
                }
                k.multiple_of = Some(divisor);
            }
            SchemaKeyword::Minimum => {
                k.minimum = Some(Limit {
                    value: number(value, pointer, keyword)?,
                    exclusive: map.get("exclusiveMinimum") == Some(&Value::Bool(true)),
                });
            }
            SchemaKeyword::Maximum => {
                k.maximum = Some(Limit {
                    value: number(value, pointer, keyword)?,
                    exclusive: map.get("exclusiveMaximum") == Some(&Value::Bool(true)),
                });
            }
            SchemaKeyword::ExclusiveMinimum => {
                if !value.is_boolean() {
                    k.exclusive_minimum = Some(number(value, pointer, keyword)?);
                }
            }
            SchemaKeyword::ExclusiveMaximum => {
                if !value.is_boolean() {
                    k.exclusive_maximum = Some(number(value, pointer, keyword)?);
                }
            }
            SchemaKeyword::MinLength => k.min_length = Some(count(value, pointer, keyword)?),
            SchemaKeyword::MaxLength => k.max_length = Some(count(value, pointer, keyword)?),
            SchemaKeyword::Pattern => k.pattern = Some(regex(value, pointer, keyword)?),
            SchemaKeyword::Items => {
                k.items = Some(match value {
                    Value::Array(schemas) => Items::Tuple(
                        schemas
                            .iter()
                            .enumerate()
                            .map(|(i, schema)| self.compile(schema, at.with_index(i)))
                            .collect::<Result<_>>()?,
                    ),
                    schema => Items::Uniform(self.compile(schema, at)?),
                });
            }
            SchemaKeyword::AdditionalItems => k.additional_items = Some(self.compile(value, at)?),
            SchemaKeyword::MinItems => k.min_items = Some(count(value, pointer, keyword)?),
            SchemaKeyword::MaxItems => k.max_items = Some(count(value, pointer, keyword)?),
            SchemaKeyword::UniqueItems => {
                k.unique_items = value
                    .as_bool()
                    .ok_or_else(|| keyword_error(pointer, keyword, "must be a boolean"))?;
            }
            SchemaKeyword::Required => {
                let names = value
                    .as_array()
                    .ok_or_else(|| keyword_error(pointer, keyword, "must be an array"))?;
                k.required = names
                    .iter()
                    .map(|name| {
                        name.as_str().map(str::to_owned).ok_or_else(|| {
                            keyword_error(pointer, keyword, "must contain only strings")
                        })
                    })
                    .collect::<Result<_>>()?;
            }
            SchemaKeyword::Properties => {
                for (name, schema) in object(value, pointer, keyword)? {
                    let id = self.compile(schema, at.with_key(name.as_str()))?;
                    k.properties.push((name.clone(), id));
                }
            }
            SchemaKeyword::PatternProperties => {
                for (pattern, schema) in object(value, pointer, keyword)? {
                    let re = Regex::new(pattern).map_err(|e| {
                        keyword_error(pointer, keyword, &format!("invalid pattern '{pattern}': {e}"))
                    })?;
                    let id = self.compile(schema, at.with_key(pattern.as_str()))?;
                    k.pattern_properties.push((re, id));
                }
            }
            SchemaKeyword::AdditionalProperties => {
                k.additional_properties = Some(self.compile(value, at)?);
            }
            SchemaKeyword::MinProperties => k.min_properties = Some(count(value, pointer, keyword)?),
            SchemaKeyword::MaxProperties => k.max_properties = Some(count(value, pointer, keyword)?),
            SchemaKeyword::AllOf => k.all_of = self.compile_list(value, at, pointer, keyword)?,
            SchemaKeyword::AnyOf => k.any_of = self.compile_list(value, at, pointer, keyword)?,
            SchemaKeyword::OneOf => k.one_of = self.compile_list(value, at, pointer, keyword)?,
            SchemaKeyword::Not => k.not = Some(self.compile(value, at)?),
            SchemaKeyword::Ref | SchemaKeyword::False => {}
        }
        Ok(())
    }

    fn compile_list(
        &mut self,
        value: &'v Value,
        at: JsonPointer,
        pointer: &JsonPointer,
        keyword: SchemaKeyword,
    ) -> Result<Vec<SchemaId>> {
        let schemas = value
            .as_array()
            .filter(|schemas| !schemas.is_empty())
            .ok_or_else(|| keyword_error(pointer, keyword, "must be a non-empty array"))?;
        schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| self.compile(schema, at.with_index(i)))
            .collect()
    }

    fn resolve_ref(&mut self, reference: &str, pointer: &JsonPointer) -> Result<SchemaId> {
        if !reference.starts_with('#') {
            return Err(keyword_error(
                pointer,
                SchemaKeyword::Ref,
                &format!("remote reference '{reference}' is not supported"),
            ));
        }
        let target = JsonPointer::parse_uri_fragment(reference)
            .map_err(|e| keyword_error(pointer, SchemaKeyword::Ref, &e.to_string()))?;
        let root = self.root;
        let value = root.pointer(&target.to_string()).ok_or_else(|| {
            keyword_error(
                pointer,
                SchemaKeyword::Ref,
                &format!("unresolvable reference '{reference}'"),
            )
        })?;
        self.compile(value, target)
    }
}

fn parse_types(value: &Value, pointer: &JsonPointer) -> Result<TypeSet> {
    let name_flag = |name: &Value| {
        name.as_str()
            .and_then(TypeSet::from_name)
            .ok_or_else(|| keyword_error(pointer, SchemaKeyword::Type, "unknown type name"))
    };
    match value {
        Value::String(_) => Ok(TypeSet(name_flag(value)?)),
        Value::Array(names) => names
            .iter()
            .try_fold(0u8, |set, name| -> Result<u8> { Ok(set | name_flag(name)?) })
            .map(TypeSet),
        _ => Err(keyword_error(
            pointer,
            SchemaKeyword::Type,
            "must be a string or an array of strings",
        )),
    }
}

fn number(value: &Value, pointer: &JsonPointer, keyword: SchemaKeyword) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| keyword_error(pointer, keyword, "must be a number"))
}

fn count(value: &Value, pointer: &JsonPointer, keyword: SchemaKeyword) -> Result<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .or_else(|| {
            value
                .as_f64()
                .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= usize::MAX as f64)
                .map(|n| n as usize)
        })
        .ok_or_else(|| keyword_error(pointer, keyword, "must be a non-negative integer"))
}

fn regex(value: &Value, pointer: &JsonPointer, keyword: SchemaKeyword) -> Result<Regex> {
    let pattern = value
        .as_str()
        .ok_or_else(|| keyword_error(pointer, keyword, "must be a string"))?;
    Regex::new(pattern).map_err(|e| keyword_error(pointer, keyword, &format!("invalid pattern: {e}")))
}

fn object<'v>(
    value: &'v Value,
    pointer: &JsonPointer,
    keyword: SchemaKeyword,
) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| keyword_error(pointer, keyword, "must be an object"))
}

/// Reject reference chains that lead back to themselves without any keyword
/// in between
fn check_ref_cycles(nodes: &[CompiledSchema]) -> Result<()> {
    for start in 0..nodes.len() {
        let mut seen = HashSet::new();
        let mut current = start;
        while let SchemaKind::Ref(target) = nodes[current].kind {
            if !seen.insert(current) {
                return Err(keyword_error(
                    &nodes[start].pointer,
                    SchemaKeyword::Ref,
                    "reference cycle",
                ));
            }
            current = target;
        }
    }
    Ok(())
}
