//! Memory management for document trees
//!
//! Every document owns one node arena, which optionally draws from a
//! [`MemoryQuota`] shared with other documents in the same session.

pub mod arena;
pub mod quota;

pub use arena::ArenaStats;
pub(crate) use arena::NodeArena;
pub use quota::MemoryQuota;
