//! Schema validation diagnostics
//!
//! A validation failure is described purely by location: where in the schema
//! the failing constraint lives, which keyword failed, and where in the
//! instance the offending value sits. No node addresses are kept, so a
//! failure can be logged or serialized long after the validated value is
//! gone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DomainError, JsonPointer};

/// JSON Schema keywords understood by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum SchemaKeyword {
    /// `type`
    Type,
    /// `enum`
    Enum,
    /// `const`
    Const,
    /// `multipleOf`
    MultipleOf,
    /// `minimum`
    Minimum,
    /// `maximum`
    Maximum,
    /// `exclusiveMinimum`
    ExclusiveMinimum,
    /// `exclusiveMaximum`
    ExclusiveMaximum,
    /// `minLength`
    MinLength,
    /// `maxLength`
    MaxLength,
    /// `pattern`
    Pattern,
    /// `items`
    Items,
    /// `additionalItems`
    AdditionalItems,
    /// `minItems`
    MinItems,
    /// `maxItems`
    MaxItems,
    /// `uniqueItems`
    UniqueItems,
    /// `required`
    Required,
    /// `properties`
    Properties,
    /// `patternProperties`
    PatternProperties,
    /// `additionalProperties`
    AdditionalProperties,
    /// `minProperties`
    MinProperties,
    /// `maxProperties`
    MaxProperties,
    /// `allOf`
    AllOf,
    /// `anyOf`
    AnyOf,
    /// `oneOf`
    OneOf,
    /// `not`
    Not,
    /// `$ref`
    Ref,
    /// The boolean schema `false`
    False,
}

impl SchemaKeyword {
    /// Keyword as spelled in a schema document
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKeyword::Type => "type",
            SchemaKeyword::Enum => "enum",
            SchemaKeyword::Const => "const",
            SchemaKeyword::MultipleOf => "multipleOf",
            SchemaKeyword::Minimum => "minimum",
            SchemaKeyword::Maximum => "maximum",
            SchemaKeyword::ExclusiveMinimum => "exclusiveMinimum",
            SchemaKeyword::ExclusiveMaximum => "exclusiveMaximum",
            SchemaKeyword::MinLength => "minLength",
            SchemaKeyword::MaxLength => "maxLength",
            SchemaKeyword::Pattern => "pattern",
            SchemaKeyword::Items => "items",
            SchemaKeyword::AdditionalItems => "additionalItems",
            SchemaKeyword::MinItems => "minItems",
            SchemaKeyword::MaxItems => "maxItems",
            SchemaKeyword::UniqueItems => "uniqueItems",
            SchemaKeyword::Required => "required",
            SchemaKeyword::Properties => "properties",
            SchemaKeyword::PatternProperties => "patternProperties",
            SchemaKeyword::AdditionalProperties => "additionalProperties",
            SchemaKeyword::MinProperties => "minProperties",
            SchemaKeyword::MaxProperties => "maxProperties",
            SchemaKeyword::AllOf => "allOf",
            SchemaKeyword::AnyOf => "anyOf",
            SchemaKeyword::OneOf => "oneOf",
            SchemaKeyword::Not => "not",
            SchemaKeyword::Ref => "$ref",
            SchemaKeyword::False => "false",
        }
    }
}

const ALL_KEYWORDS: [SchemaKeyword; 28] = [
    SchemaKeyword::Type,
    SchemaKeyword::Enum,
    SchemaKeyword::Const,
    SchemaKeyword::MultipleOf,
    SchemaKeyword::Minimum,
    SchemaKeyword::Maximum,
    SchemaKeyword::ExclusiveMinimum,
    SchemaKeyword::ExclusiveMaximum,
    SchemaKeyword::MinLength,
    SchemaKeyword::MaxLength,
    SchemaKeyword::Pattern,
    SchemaKeyword::Items,
    SchemaKeyword::AdditionalItems,
    SchemaKeyword::MinItems,
    SchemaKeyword::MaxItems,
    SchemaKeyword::UniqueItems,
    SchemaKeyword::Required,
    SchemaKeyword::Properties,
    SchemaKeyword::PatternProperties,
    SchemaKeyword::AdditionalProperties,
    SchemaKeyword::MinProperties,
    SchemaKeyword::MaxProperties,
    SchemaKeyword::AllOf,
    SchemaKeyword::AnyOf,
    SchemaKeyword::OneOf,
    SchemaKeyword::Not,
    SchemaKeyword::Ref,
    SchemaKeyword::False,
];

impl FromStr for SchemaKeyword {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYWORDS
            .iter()
            .copied()
            .find(|keyword| keyword.as_str() == s)
            .ok_or_else(|| DomainError::UnknownKeyword(s.to_string()))
    }
}

impl TryFrom<String> for SchemaKeyword {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaKeyword> for &'static str {
    fn from(keyword: SchemaKeyword) -> Self {
        keyword.as_str()
    }
}

impl fmt::Display for SchemaKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First failing constraint found while validating an instance
///
/// # Examples
/// ```
/// # use arbor_json_domain::{JsonPointer, SchemaKeyword, ValidationFailure};
/// let failure = ValidationFailure::new(
///     JsonPointer::parse("/properties/a").unwrap(),
///     SchemaKeyword::Type,
///     JsonPointer::parse("/a").unwrap(),
/// );
/// assert_eq!(
///     failure.to_string(),
///     "SchemaURI: #/properties/a Keyword: type DocumentURI: #/a"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Location of the failing subschema within the schema document
    pub schema_pointer: JsonPointer,
    /// Keyword whose constraint failed
    pub keyword: SchemaKeyword,
    /// Location of the offending value within the validated instance
    pub instance_pointer: JsonPointer,
}

impl ValidationFailure {
    /// Create a failure record
    pub fn new(
        schema_pointer: JsonPointer,
        keyword: SchemaKeyword,
        instance_pointer: JsonPointer,
    ) -> Self {
        Self {
            schema_pointer,
            keyword,
            instance_pointer,
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SchemaURI: {} Keyword: {} DocumentURI: {}",
            self.schema_pointer.to_uri_fragment(),
            self.keyword,
            self.instance_pointer.to_uri_fragment()
        )
    }
}
