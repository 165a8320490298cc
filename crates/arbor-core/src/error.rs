//! Error types for arbor-json operations

use arbor_json_domain::ValidationFailure;

/// Result type alias for arbor-json operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for arbor-json operations
///
/// Every variant renders to a single descriptive message so a host binding
/// can surface it as one error value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Input text could not be decoded
    #[error("failed to parse offset:{offset} {message}")]
    Parse {
        /// Byte offset in the (decompressed) input where decoding stopped
        offset: usize,
        /// Error description
        message: String,
    },

    /// Handle is not registered with this document
    #[error("invalid value")]
    InvalidHandle,

    /// Operation is not defined for the value's type
    #[error("{0}")]
    TypeMismatch(String),

    /// Arena quota or allocation failure
    #[error("memory allocation failed: {0}")]
    MemoryExhausted(String),

    /// Iterator's container is no longer registered
    #[error("iterator has been invalidated")]
    IteratorInvalidated,

    /// Schema text could not be compiled
    #[error("failed to compile schema offset:{offset} {message}")]
    SchemaCompile {
        /// Byte offset in the schema text, zero for keyword errors
        offset: usize,
        /// Error description
        message: String,
    },

    /// Value does not satisfy a schema
    #[error("{0}")]
    Validation(ValidationFailure),

    /// Removal was requested without any path steps
    #[error("cannot remove the root")]
    CannotRemoveRoot,

    /// Compressed input could not be inflated within limits
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// Encoded output could not be written
    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    /// Create a memory exhaustion error
    pub fn memory(message: impl Into<String>) -> Self {
        Self::MemoryExhausted(message.into())
    }

    /// Create a schema compilation error
    pub fn schema_compile(offset: usize, message: impl Into<String>) -> Self {
        Self::SchemaCompile {
            offset,
            message: message.into(),
        }
    }

    /// Create a decompression error
    pub fn decompression(message: impl Into<String>) -> Self {
        Self::Decompression(message.into())
    }
}

impl From<ValidationFailure> for Error {
    fn from(failure: ValidationFailure) -> Self {
        Error::Validation(failure)
    }
}
