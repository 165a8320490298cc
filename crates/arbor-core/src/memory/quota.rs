//! Session-wide allocation budget

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Error, Result};

#[derive(Debug)]
struct QuotaInner {
    limit: usize,
    used: AtomicUsize,
}

/// Shared byte budget for arena allocations
///
/// Cloning yields another reference to the same budget, so several documents
/// created from one configuration draw from a single pool. Charges are
/// refunded when nodes are released, when an arena is reset and when a
/// document is dropped.
///
/// # Examples
/// ```
/// # use arbor_json::MemoryQuota;
/// let quota = MemoryQuota::new(1024);
/// assert_eq!(quota.used(), 0);
/// assert_eq!(quota.remaining(), 1024);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryQuota {
    inner: Arc<QuotaInner>,
}

impl MemoryQuota {
    /// Create a budget of `limit` bytes
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(QuotaInner {
                limit,
                used: AtomicUsize::new(0),
            }),
        }
    }

    /// Total budget in bytes
    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Bytes currently charged
    pub fn used(&self) -> usize {
        self.inner.used.load(Ordering::Acquire)
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.used())
    }

    /// Charge `bytes` against the budget, failing without side effects when
    /// the budget would be exceeded
    pub(crate) fn try_charge(&self, bytes: usize) -> Result<()> {
        let limit = self.inner.limit;
        self.inner
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|next| *next <= limit)
            })
            .map(|_| ())
            .map_err(|used| {
                Error::memory(format!(
                    "quota exceeded: {used} + {bytes} bytes > {limit} bytes"
                ))
            })
    }

    /// Return `bytes` to the budget
    pub(crate) fn refund(&self, bytes: usize) {
        let _ = self
            .inner
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(bytes))
            });
    }
}
