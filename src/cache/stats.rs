//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, writes and evictions.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Counters ==
/// Running counters owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Successful reads
    pub hits: u64,
    /// Reads of missing or expired keys
    pub misses: u64,
    /// Successful `set` calls
    pub writes: u64,
    /// Entries removed to make room
    pub evictions: u64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Cache Stats ==
/// Point-in-time report returned by `stats()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
    /// hits / (hits + misses), 0 when no reads yet
    pub hit_rate: f64,
    /// Live entry count
    pub entries: usize,
    /// Sum of entry size estimates in bytes
    pub memory_bytes: usize,
    /// Average entry size estimate in bytes
    pub avg_entry_bytes: usize,
    /// When the store was created (RFC 3339)
    pub started_at: String,
    pub uptime_ms: u64,
}

impl CacheStats {
    /// Builds a report from the counters and the store's current footprint.
    pub fn collect(
        counters: &CacheCounters,
        entries: usize,
        memory_bytes: usize,
        started_at_ms: u64,
        now_ms: u64,
    ) -> Self {
        let avg_entry_bytes = if entries == 0 {
            0
        } else {
            memory_bytes / entries
        };

        Self {
            hits: counters.hits,
            misses: counters.misses,
            writes: counters.writes,
            evictions: counters.evictions,
            hit_rate: counters.hit_rate(),
            entries,
            memory_bytes,
            avg_entry_bytes,
            started_at: format_timestamp(started_at_ms),
            uptime_ms: now_ms.saturating_sub(started_at_ms),
        }
    }
}

fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.to_rfc3339())
        .unwrap_or_default()
}
