//! # arbor-json
//!
//! Handle-based JSON document model for embedding in dynamic host runtimes.
//!
//! A [`Document`] owns an arena of nodes. Hosts never see nodes, only opaque
//! [`Handle`]s, and every handle is re-validated through the document's
//! registry before use. Handles survive tree mutations they are not involved
//! in, and are invalidated (never dangling) by re-parsing, resetting,
//! deep removal and destruction.
//!
//! ## Lifecycle
//!
//! - [`Document::parse`] decodes a copy of the input, [`Document::parse_in_place`]
//!   decodes through a reusable document buffer and inflates gzip input
//! - [`Document::find`], [`Document::members`], [`Document::elements`] navigate
//! - [`Document::remove`] extracts subtrees, deep (into a new document) or
//!   shallow (orphaned in place until teardown)
//! - [`Document::validate`] checks a value against a compiled [`SchemaDocument`]
//!
//! ```
//! use arbor_json::{Document, Scalar, path};
//!
//! let mut doc = Document::from_json(r#"{"user":{"name":"ada","tags":["x","y"]}}"#, true)?;
//! let tags = doc.find(None, &path!["user", "tags"])?.expect("tags");
//! assert_eq!(doc.size(Some(tags))?, 2);
//!
//! let user = doc.remove_deep(None, &path!["user"])?.expect("user");
//! assert!(!doc.is_valid(tags));
//! assert_eq!(user.serialize(None)?, r#"{"name":"ada","tags":["x","y"]}"#);
//! # Ok::<(), arbor_json::Error>(())
//! ```

#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod compression;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod iter;
pub mod memory;
pub mod navigator;
pub mod registry;
pub mod schema;

mod parser;
mod tree;

pub use compression::{Decompressor, default_decompressor};
#[cfg(feature = "compression")]
pub use compression::GzipDecompressor;
pub use config::{DocumentConfig, DocumentLimits};
pub use document::{Document, DocumentStats, Input, Scalar};
pub use error::{Error, Result};
pub use extract::{RemoveMode, Removed};
pub use iter::{ArrayIter, ContainerIter, ObjectIter};
pub use memory::{ArenaStats, MemoryQuota};
pub use registry::{DocumentId, Handle};
pub use schema::{SchemaDocument, Validation};
pub use tree::NodeId;

// Domain value objects
pub use arbor_json_domain::{
    DomainError, JsonPointer, PointerToken, SchemaKeyword, Step, Steps, ValidationFailure,
    ValueType, path,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
