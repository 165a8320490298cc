//! Schema validation over an arena subtree
//!
//! Keywords of one schema are checked in a fixed order (type, enum, const,
//! type-specific constraints, then combinators) and children in instance
//! order. The first failure wins.

use arbor_json_domain::{JsonPointer, SchemaKeyword, ValidationFailure};
use serde_json::Value;

use crate::memory::NodeArena;
use crate::schema::compile::{CompiledSchema, Items, Keywords, SchemaId, SchemaKind, TypeSet};
use crate::tree::{Member, Node, NodeId};

type Outcome = std::result::Result<(), ValidationFailure>;

/// Relative tolerance for `multipleOf` on non-integral quotients
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

/// Validates one subtree against a compiled schema
pub(crate) struct Validator<'a> {
    nodes: &'a [CompiledSchema],
    arena: &'a NodeArena,
    buffer: &'a str,
    max_depth: usize,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(
        nodes: &'a [CompiledSchema],
        arena: &'a NodeArena,
        buffer: &'a str,
        max_depth: usize,
    ) -> Self {
        Self {
            nodes,
            arena,
            buffer,
            max_depth,
        }
    }

    pub(crate) fn validate(&self, schema: SchemaId, node: NodeId) -> Outcome {
        self.validate_with_depth(schema, node, &JsonPointer::root(), 0)
    }

    fn fail(&self, schema: SchemaId, keyword: SchemaKeyword, instance: &JsonPointer) -> ValidationFailure {
        ValidationFailure::new(self.nodes[schema].pointer.clone(), keyword, instance.clone())
    }

    fn validate_with_depth(
        &self,
        schema: SchemaId,
        node: NodeId,
        instance: &JsonPointer,
        depth: usize,
    ) -> Outcome {
        if depth > self.max_depth {
            return Err(self.fail(schema, SchemaKeyword::Ref, instance));
        }
        match &self.nodes[schema].kind {
            SchemaKind::Always => Ok(()),
            SchemaKind::Never => Err(self.fail(schema, SchemaKeyword::False, instance)),
            SchemaKind::Ref(target) => self.validate_with_depth(*target, node, instance, depth + 1),
            SchemaKind::Keywords(k) => self.validate_keywords(schema, k, node, instance, depth),
        }
    }

    /// Validate against a subschema reached through `keyword`; a `false`
    /// subschema fails as that keyword of the parent
    fn validate_sub(
        &self,
        parent: SchemaId,
        keyword: SchemaKeyword,
        sub: SchemaId,
        node: NodeId,
        instance: &JsonPointer,
        depth: usize,
    ) -> Outcome {
        if matches!(self.nodes[sub].kind, SchemaKind::Never) {
            return Err(self.fail(parent, keyword, instance));
        }
        self.validate_with_depth(sub, node, instance, depth + 1)
    }

    fn validate_keywords(
        &self,
        schema: SchemaId,
        k: &Keywords,
        node: NodeId,
        instance: &JsonPointer,
        depth: usize,
    ) -> Outcome {
        let Some(n) = self.arena.get(node) else {
            return Err(self.fail(schema, SchemaKeyword::Type, instance));
        };

        if let Some(types) = k.types {
            if !type_matches(types, n) {
                return Err(self.fail(schema, SchemaKeyword::Type, instance));
            }
        }
        if let Some(values) = &k.enum_values {
            if !values.iter().any(|v| self.equals_value(node, v)) {
                return Err(self.fail(schema, SchemaKeyword::Enum, instance));
            }
        }
        if let Some(value) = &k.const_value {
            if !self.equals_value(node, value) {
                return Err(self.fail(schema, SchemaKeyword::Const, instance));
            }
        }

        match n {
            Node::Number(x) => self.validate_number(schema, k, *x, instance)?,
            Node::String(s) => self.validate_string(schema, k, s.resolve(self.buffer), instance)?,
            Node::Array(items) => self.validate_array(schema, k, items, instance, depth)?,
            Node::Object(members) => self.validate_object(schema, k, members, instance, depth)?,
            Node::Null | Node::Bool(_) => {}
        }

        for sub in &k.all_of {
            self.validate_with_depth(*sub, node, instance, depth + 1)?;
        }
        if !k.any_of.is_empty()
            && !k
                .any_of
                .iter()
                .any(|sub| self.validate_with_depth(*sub, node, instance, depth + 1).is_ok())
        {
            return Err(self.fail(schema, SchemaKeyword::AnyOf, instance));
        }
        if !k.one_of.is_empty() {
            let passed = k
                .one_of
                .iter()
                .filter(|sub| self.validate_with_depth(**sub, node, instance, depth + 1).is_ok())
                .take(2)
                .count();
            if passed != 1 {
                return Err(self.fail(schema, SchemaKeyword::OneOf, instance));
            }
        }
        if let Some(not) = k.not {
            if self.validate_with_depth(not, node, instance, depth + 1).is_ok() {
                return Err(self.fail(schema, SchemaKeyword::Not, instance));
            }
        }
        Ok(())
    }

    fn validate_number(&self, schema: SchemaId, k: &Keywords, x: f64, instance: &JsonPointer) -> Outcome {
        if let Some(divisor) = k.multiple_of {
            let quotient = x / divisor;
            if !quotient.is_finite()
                || (quotient - quotient.round()).abs() > MULTIPLE_OF_EPSILON * quotient.abs().max(1.0)
            {
                return Err(self.fail(schema, SchemaKeyword::MultipleOf, instance));
            }
        }
        if let Some(min) = k.minimum {
            if x < min.value || (min.exclusive && x == min.value) {
                return Err(self.fail(schema, SchemaKeyword::Minimum, instance));
            }
        }
        if let Some(max) = k.maximum {
            if x > max.value || (max.exclusive && x == max.value) {
                return Err(self.fail(schema, SchemaKeyword::Maximum, instance));
            }
        }
        if let Some(limit) = k.exclusive_minimum {
            if x <= limit {
                return Err(self.fail(schema, SchemaKeyword::ExclusiveMinimum, instance));
            }
        }
        if let Some(limit) = k.exclusive_maximum {
            if x >= limit {
                return Err(self.fail(schema, SchemaKeyword::ExclusiveMaximum, instance));
            }
        }
        Ok(())
    }

    fn validate_string(&self, schema: SchemaId, k: &Keywords, s: &str, instance: &JsonPointer) -> Outcome {
        if k.min_length.is_some() || k.max_length.is_some() {
            let len = s.chars().count();
            if k.min_length.is_some_and(|min| len < min) {
                return Err(self.fail(schema, SchemaKeyword::MinLength, instance));
            }
            if k.max_length.is_some_and(|max| len > max) {
                return Err(self.fail(schema, SchemaKeyword::MaxLength, instance));
            }
        }
        if let Some(pattern) = &k.pattern {
            if !pattern.is_match(s) {
                return Err(self.fail(schema, SchemaKeyword::Pattern, instance));
            }
        }
        Ok(())
    }

    fn validate_array(
        &self,
        schema: SchemaId,
        k: &Keywords,
        items: &[NodeId],
        instance: &JsonPointer,
        depth: usize,
    ) -> Outcome {
        if k.min_items.is_some_and(|min| items.len() < min) {
            return Err(self.fail(schema, SchemaKeyword::MinItems, instance));
        }
        if k.max_items.is_some_and(|max| items.len() > max) {
            return Err(self.fail(schema, SchemaKeyword::MaxItems, instance));
        }
        if k.unique_items {
            for (i, a) in items.iter().enumerate() {
                if items[i + 1..].iter().any(|b| self.equals_node(*a, *b)) {
                    return Err(self.fail(schema, SchemaKeyword::UniqueItems, instance));
                }
            }
        }

        match &k.items {
            Some(Items::Uniform(sub)) => {
                for (i, item) in items.iter().enumerate() {
                    let at = instance.with_index(i);
                    self.validate_sub(schema, SchemaKeyword::Items, *sub, *item, &at, depth)?;
                }
            }
            Some(Items::Tuple(subs)) => {
                for (i, item) in items.iter().enumerate() {
                    let at = instance.with_index(i);
                    match subs.get(i) {
                        Some(sub) => {
                            self.validate_sub(schema, SchemaKeyword::Items, *sub, *item, &at, depth)?
                        }
                        None => {
                            if let Some(extra) = k.additional_items {
                                self.validate_sub(
                                    schema,
                                    SchemaKeyword::AdditionalItems,
                                    extra,
                                    *item,
                                    &at,
                                    depth,
                                )?;
                            }
                        }
                    }
                }
            }
            None => {}
        }
        Ok(())
    }

    fn validate_object(
        &self,
        schema: SchemaId,
        k: &Keywords,
        members: &[Member],
        instance: &JsonPointer,
        depth: usize,
    ) -> Outcome {
        if k.min_properties.is_some_and(|min| members.len() < min) {
            return Err(self.fail(schema, SchemaKeyword::MinProperties, instance));
        }
        if k.max_properties.is_some_and(|max| members.len() > max) {
            return Err(self.fail(schema, SchemaKeyword::MaxProperties, instance));
        }
        for name in &k.required {
            if !members.iter().any(|m| m.name.resolve(self.buffer) == name) {
                return Err(self.fail(schema, SchemaKeyword::Required, instance));
            }
        }

        for member in members {
            let name = member.name.resolve(self.buffer);
            let at = instance.with_key(name);
            let mut matched = false;

            if let Some((_, sub)) = k.properties.iter().find(|(property, _)| property == name) {
                matched = true;
                self.validate_sub(schema, SchemaKeyword::Properties, *sub, member.value, &at, depth)?;
            }
            for (pattern, sub) in &k.pattern_properties {
                if pattern.is_match(name) {
                    matched = true;
                    self.validate_sub(
                        schema,
                        SchemaKeyword::PatternProperties,
                        *sub,
                        member.value,
                        &at,
                        depth,
                    )?;
                }
            }
            if !matched {
                if let Some(extra) = k.additional_properties {
                    self.validate_sub(
                        schema,
                        SchemaKeyword::AdditionalProperties,
                        extra,
                        member.value,
                        &at,
                        depth,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Structural equality between a tree node and a schema literal
    fn equals_value(&self, node: NodeId, value: &Value) -> bool {
        let Some(n) = self.arena.get(node) else {
            return false;
        };
        match (n, value) {
            (Node::Null, Value::Null) => true,
            (Node::Bool(a), Value::Bool(b)) => a == b,
            (Node::Number(a), Value::Number(b)) => b.as_f64() == Some(*a),
            (Node::String(a), Value::String(b)) => a.resolve(self.buffer) == b,
            (Node::Array(items), Value::Array(values)) => {
                items.len() == values.len()
                    && items
                        .iter()
                        .zip(values)
                        .all(|(item, value)| self.equals_value(*item, value))
            }
            (Node::Object(members), Value::Object(map)) => {
                members.len() == map.len()
                    && map.iter().all(|(name, value)| {
                        members
                            .iter()
                            .find(|m| m.name.resolve(self.buffer) == name)
                            .is_some_and(|m| self.equals_value(m.value, value))
                    })
            }
            _ => false,
        }
    }

    /// Structural equality between two tree nodes
    fn equals_node(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(x), Some(y)) = (self.arena.get(a), self.arena.get(b)) else {
            return false;
        };
        match (x, y) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(p), Node::Bool(q)) => p == q,
            (Node::Number(p), Node::Number(q)) => p == q,
            (Node::String(p), Node::String(q)) => p.resolve(self.buffer) == q.resolve(self.buffer),
            (Node::Array(p), Node::Array(q)) => {
                p.len() == q.len() && p.iter().zip(q).all(|(i, j)| self.equals_node(*i, *j))
            }
            (Node::Object(p), Node::Object(q)) => {
                p.len() == q.len()
                    && p.iter().all(|m| {
                        let name = m.name.resolve(self.buffer);
                        q.iter()
                            .find(|other| other.name.resolve(self.buffer) == name)
                            .is_some_and(|other| self.equals_node(m.value, other.value))
                    })
            }
            _ => false,
        }
    }
}

fn type_matches(types: TypeSet, node: &Node) -> bool {
    match node {
        Node::Null => types.contains(TypeSet::NULL),
        Node::Bool(_) => types.contains(TypeSet::BOOLEAN),
        Node::Number(n) => {
            types.contains(TypeSet::NUMBER) || (types.contains(TypeSet::INTEGER) && n.fract() == 0.0)
        }
        Node::String(_) => types.contains(TypeSet::STRING),
        Node::Array(_) => types.contains(TypeSet::ARRAY),
        Node::Object(_) => types.contains(TypeSet::OBJECT),
    }
}
