//! Arbor Domain Layer - Pure Value Objects
//!
//! This crate contains the value objects shared by the arbor-json engine and
//! any host binding built on top of it. Nothing here owns a tree, an arena or
//! a registry: every type is a plain value that can be copied into host
//! memory and outlive the document it was produced from.
//!
//! ## Contents
//!
//! - **Steps**: [`Step`] and the [`path!`] macro, the vocabulary for walking a tree
//! - **Value types**: [`ValueType`], the host-visible type names
//! - **Pointers**: [`JsonPointer`], RFC 6901 pointers with URI-fragment rendering
//! - **Schema diagnostics**: [`SchemaKeyword`] and [`ValidationFailure`]

#![warn(missing_docs)]

pub mod value_objects;

pub use value_objects::{
    JsonPointer, PointerToken, SchemaKeyword, Step, Steps, ValidationFailure, ValueType,
};

/// Domain Result type
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-specific errors
///
/// All domain errors are value types with no external dependencies.
/// Uses thiserror for ergonomic error handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DomainError {
    /// Invalid JSON pointer syntax
    #[error("Invalid JSON pointer: {0}")]
    InvalidPointer(String),

    /// Unknown schema keyword name
    #[error("Unknown schema keyword: {0}")]
    UnknownKeyword(String),
}

impl DomainError {
    /// Create an invalid pointer error
    pub fn invalid_pointer(message: impl Into<String>) -> Self {
        Self::InvalidPointer(message.into())
    }
}
