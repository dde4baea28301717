//! Snapshot Module
//!
//! Serialized form of the entry table written to durable storage.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::clock::duration_ms;
use crate::cache::CacheEntry;
use crate::error::PersistenceError;
use crate::storage::DurableStorage;

/// Snapshots older than this are discarded whole on load.
pub const SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

// == Snapshot ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken (Unix milliseconds)
    pub saved_at: u64,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl Snapshot {
    pub fn is_stale_at(&self, now: u64) -> bool {
        now.saturating_sub(self.saved_at) > duration_ms(SNAPSHOT_MAX_AGE)
    }

    // == Save ==
    pub fn save(&self, storage: &dyn DurableStorage, slot: &str) -> Result<(), PersistenceError> {
        let encoded = serde_json::to_string(self)?;
        storage.set(slot, &encoded)
    }

    // == Load ==
    /// Reads the snapshot in `slot` as of `now`.
    ///
    /// Returns `None` when nothing was saved or the snapshot is stale; a stale
    /// snapshot is also removed from storage.
    pub fn load(
        storage: &dyn DurableStorage,
        slot: &str,
        now: u64,
    ) -> Result<Option<Self>, PersistenceError> {
        let Some(encoded) = storage.get(slot)? else {
            return Ok(None);
        };

        let snapshot: Snapshot = serde_json::from_str(&encoded)?;
        if snapshot.is_stale_at(now) {
            storage.remove(slot)?;
            return Ok(None);
        }
        Ok(Some(snapshot))
    }
}
