//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::Strategy;

// == Stored Value ==
/// Internal representation of a cached payload.
///
/// Large values are kept as their serialized text so the size estimate is
/// computed once; `unpack` restores the original JSON. Callers of the store
/// never see this wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum StoredValue {
    Plain(Value),
    Packed(String),
}

impl StoredValue {
    /// Wraps `value`, packing it when its serialized form exceeds `threshold` bytes.
    ///
    /// Returns the wrapper and the serialized size estimate.
    pub fn pack(value: Value, threshold: usize) -> (Self, usize) {
        let text = value.to_string();
        let size = text.len();
        if size > threshold {
            (StoredValue::Packed(text), size)
        } else {
            (StoredValue::Plain(value), size)
        }
    }

    /// Returns the original JSON value.
    pub fn unpack(&self) -> serde_json::Result<Value> {
        match self {
            StoredValue::Plain(value) => Ok(value.clone()),
            StoredValue::Packed(text) => serde_json::from_str(text),
        }
    }

    pub fn is_packed(&self) -> bool {
        matches!(self, StoredValue::Packed(_))
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// All timestamps are Unix milliseconds so that entries survive a snapshot
/// round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: StoredValue,
    /// Insertion time
    pub created_at: u64,
    /// Most recent successful read (or insertion)
    pub last_accessed_at: u64,
    /// Entry is absent from this instant on
    pub expires_at: u64,
    /// Preset used to derive `expires_at`; `None` for explicit durations
    pub strategy: Option<Strategy>,
    /// Serialized size estimate, reporting only
    pub approx_size: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_ms` after `now`.
    pub fn new(
        value: Value,
        now: u64,
        ttl_ms: u64,
        strategy: Option<Strategy>,
        pack_threshold: usize,
    ) -> Self {
        let (value, approx_size) = StoredValue::pack(value, pack_threshold);
        Self {
            value,
            created_at: now,
            last_accessed_at: now,
            expires_at: now.saturating_add(ttl_ms),
            strategy,
            approx_size,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    /// Label for diagnostics.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.map_or("custom", |s| s.as_str())
    }

    /// Diagnostic view of this entry as seen at `now`.
    pub fn info(&self, key: &str, now: u64) -> EntryInfo {
        EntryInfo {
            key: key.to_string(),
            strategy: self.strategy_name(),
            ttl_remaining_ms: self.ttl_remaining_ms(now),
            approx_size: self.approx_size,
        }
    }
}

// == Entry Info ==
/// Per-entry metadata reported by the admin surface. Carries no value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    /// Strategy label, `"custom"` for explicit durations
    pub strategy: &'static str,
    pub ttl_remaining_ms: u64,
    pub approx_size: usize,
}
