//! Cache Module
//!
//! Fixed-slot in-memory response cache with per-slot readers/writer
//! synchronization and recency-based eviction.

mod slot;
mod stats;
mod store;


// Re-export public types
pub use slot::{CacheSlot, SlotSnapshot};
pub use stats::{CacheCounters, CacheStats};
pub use store::{CacheEntryView, CacheStore};
