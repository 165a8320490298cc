//! Domain Value Objects
//!
//! Immutable objects that represent concepts in the domain
//! with no conceptual identity, only defined by their attributes.

mod pointer;
mod schema;
mod step;
mod value_type;

pub use pointer::{JsonPointer, PointerToken};
pub use schema::{SchemaKeyword, ValidationFailure};
pub use step::{Step, Steps};
pub use value_type::ValueType;
