//! Document configuration
//!
//! [`DocumentLimits`] holds the plain, serializable knobs; [`DocumentConfig`]
//! adds the runtime collaborators (memory quota, decompressor) that cannot be
//! expressed as data.

use std::fmt;
use std::sync::Arc;

use crate::compression::Decompressor;
use crate::memory::MemoryQuota;

/// Numeric limits applied by a document
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DocumentLimits {
    /// Maximum size of inflated compressed input in bytes; zero means
    /// unbounded
    pub max_decompressed_size: usize,
    /// Maximum schema nesting followed while validating one value
    pub max_validation_depth: usize,
    /// Node slots reserved up front in a fresh arena
    pub initial_arena_capacity: usize,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_decompressed_size: 8 * 1024 * 1024, // 8MB
            max_validation_depth: 128,
            initial_arena_capacity: 256,
        }
    }
}

impl DocumentLimits {
    /// Limits for per-message pipelines handling large payloads
    pub fn high_throughput() -> Self {
        Self {
            max_decompressed_size: 64 * 1024 * 1024, // 64MB
            max_validation_depth: 256,
            initial_arena_capacity: 4096,
        }
    }

    /// Limits for constrained sandboxes
    pub fn low_memory() -> Self {
        Self {
            max_decompressed_size: 1024 * 1024, // 1MB
            max_validation_depth: 64,
            initial_arena_capacity: 32,
        }
    }
}

/// Full configuration of a document
#[derive(Clone)]
pub struct DocumentConfig {
    /// Numeric limits
    pub limits: DocumentLimits,
    /// Shared allocation budget; `None` means unbounded
    pub quota: Option<MemoryQuota>,
    /// Inflater for compressed in-place input; `None` disables detection
    pub decompressor: Option<Arc<dyn Decompressor>>,
}

impl DocumentConfig {
    /// Configuration with the given limits and default collaborators
    pub fn with_limits(limits: DocumentLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Attach a shared memory quota
    pub fn quota(mut self, quota: MemoryQuota) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Replace the decompressor
    pub fn decompressor(mut self, decompressor: Option<Arc<dyn Decompressor>>) -> Self {
        self.decompressor = decompressor;
        self
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            limits: DocumentLimits::default(),
            quota: None,
            decompressor: crate::compression::default_decompressor(),
        }
    }
}

impl fmt::Debug for DocumentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentConfig")
            .field("limits", &self.limits)
            .field("quota", &self.quota)
            .field(
                "decompressor",
                &self.decompressor.as_ref().map(|d| d.name()),
            )
            .finish()
    }
}
