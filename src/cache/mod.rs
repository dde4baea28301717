//! Cache Module
//!
//! Provides in-memory caching with TTL strategies, LRU eviction, periodic
//! sweeping and best-effort snapshot persistence.

pub mod clock;
mod entry;
mod invalidation;
mod recency;
mod shared;
mod snapshot;
mod stats;
mod store;
mod strategy;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryInfo, StoredValue};
pub use invalidation::Invalidation;
pub use recency::RecencyIndex;
pub use shared::{Cache, CacheBuilder};
pub use snapshot::{Snapshot, SNAPSHOT_MAX_AGE};
pub use stats::{CacheCounters, CacheStats};
pub use store::CacheStore;
pub use strategy::{Expiry, Strategy, StrategyTable};
