//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with recency tracking,
//! TTL expiration and strategy presets.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::clock::{duration_ms, Clock, SystemClock};
use crate::cache::{
    CacheCounters, CacheEntry, CacheStats, EntryInfo, Expiry, Invalidation, RecencyIndex,
    Snapshot, Strategy, StrategyTable,
};
use crate::config::{CacheConfig, CacheConfigPatch};

// == Cache Store ==
/// Bounded key → JSON store with per-entry expiry and LRU eviction.
///
/// All operations are synchronous. Sharing across tasks goes through
/// [`Cache`](crate::cache::Cache), which wraps the store in a lock.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Access order for eviction
    recency: RecencyIndex,
    /// Performance counters
    counters: CacheCounters,
    config: CacheConfig,
    strategies: StrategyTable,
    clock: Arc<dyn Clock>,
    /// Creation time (Unix milliseconds)
    started_at: u64,
}

/// Outcome of looking a key up, computed before mutating the store.
enum Lookup {
    Missing,
    Expired,
    Corrupt(serde_json::Error),
    Live(Value),
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store on the system clock with the default strategy table.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_parts(config, StrategyTable::default(), Arc::new(SystemClock))
    }

    /// Creates a store with an explicit strategy table and clock.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_parts(mut config: CacheConfig, strategies: StrategyTable, clock: Arc<dyn Clock>) -> Self {
        config.max_entries = config.max_entries.max(1);
        let started_at = clock.now_ms();
        Self {
            entries: HashMap::new(),
            recency: RecencyIndex::new(),
            counters: CacheCounters::new(),
            config,
            strategies,
            clock,
            started_at,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Resolves an expiry to a TTL in milliseconds and the strategy label.
    fn resolve(&self, expiry: Expiry) -> (u64, Option<Strategy>) {
        match expiry {
            Expiry::Default => (duration_ms(self.config.default_ttl), None),
            Expiry::After(ttl) => (duration_ms(ttl), None),
            Expiry::Strategy(strategy) => (duration_ms(self.strategies.ttl(strategy)), Some(strategy)),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A new key arriving at a full store first evicts the least recently
    /// used entry.
    pub fn set(&mut self, key: impl Into<String>, value: Value, expiry: impl Into<Expiry>) {
        let key = key.into();
        let (ttl_ms, strategy) = self.resolve(expiry.into());

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.config.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        let entry = CacheEntry::new(value, self.now(), ttl_ms, strategy, self.config.pack_threshold);
        self.entries.insert(key.clone(), entry);
        self.recency.touch(&key);
        self.counters.record_write();
    }

    fn evict_oldest(&mut self) -> bool {
        match self.recency.pop_oldest() {
            Some(victim) => {
                self.entries.remove(&victim);
                self.counters.record_eviction();
                debug!(key = %victim, "Evicted least recently used entry");
                true
            }
            None => false,
        }
    }

    // == Get ==
    /// Returns the value for `key` if present and unexpired.
    ///
    /// Expired entries are removed on the spot. Both outcomes are counted.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.now();
        let lookup = match self.entries.get_mut(key) {
            None => Lookup::Missing,
            Some(entry) if entry.is_expired_at(now) => Lookup::Expired,
            Some(entry) => match entry.value.unpack() {
                Ok(value) => {
                    entry.last_accessed_at = now;
                    Lookup::Live(value)
                }
                Err(e) => Lookup::Corrupt(e),
            },
        };

        match lookup {
            Lookup::Live(value) => {
                self.recency.touch(key);
                self.counters.record_hit();
                Some(value)
            }
            Lookup::Missing => {
                self.counters.record_miss();
                None
            }
            Lookup::Expired => {
                self.remove(key);
                self.counters.record_miss();
                None
            }
            Lookup::Corrupt(e) => {
                warn!(key = %key, error = %e, "Dropping unreadable cache entry");
                self.remove(key);
                self.counters.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Reads a live value without touching counters or recency.
    pub fn peek(&self, key: &str) -> Option<Value> {
        let now = self.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .and_then(|entry| entry.value.unpack().ok())
    }

    /// Whether `key` holds a live entry. No side effects.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Entry metadata for diagnostics. No side effects.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    fn remove(&mut self, key: &str) -> bool {
        self.recency.remove(key);
        self.entries.remove(key).is_some()
    }

    // == Invalidate ==
    /// Removes every key the target matches. Returns how many were removed.
    pub fn invalidate(&mut self, target: &Invalidation) -> usize {
        if let Invalidation::Key(key) = target {
            return usize::from(self.remove(key));
        }

        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| target.matches(key))
            .cloned()
            .collect();

        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    // == Sweep ==
    /// Removes all expired entries and returns the number removed.
    pub fn sweep(&mut self) -> usize {
        let now = self.now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let memory_bytes = self.entries.values().map(|entry| entry.approx_size).sum();
        CacheStats::collect(
            &self.counters,
            self.entries.len(),
            memory_bytes,
            self.started_at,
            self.now(),
        )
    }

    // == Clear ==
    /// Empties the store, zeroes the counters and restarts the uptime clock.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.counters.reset();
        self.started_at = self.now();
    }

    // == Configure ==
    /// Merges new settings. Existing entries are not re-evaluated; a lowered
    /// capacity is enforced on the next insertion of a new key.
    pub fn configure(&mut self, patch: &CacheConfigPatch) {
        self.config.apply(patch);
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Sorted list of stored keys, expired or not.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Diagnostics for every live entry, sorted by key. No side effects.
    pub fn describe(&self) -> Vec<EntryInfo> {
        let now = self.now();
        let mut infos: Vec<EntryInfo> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| entry.info(key, now))
            .collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Snapshot ==
    /// Copies the live entries for persistence.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.now();
        Snapshot {
            saved_at: now,
            entries: self
                .entries
                .iter()
                .filter(|(_, entry)| !entry.is_expired_at(now))
                .map(|(key, entry)| (key.clone(), entry.clone()))
                .collect(),
        }
    }

    // == Restore ==
    /// Loads the unexpired entries of a snapshot, oldest access first, so
    /// recency order survives and capacity keeps the most recent ones.
    ///
    /// Returns the number of entries held afterwards.
    pub fn restore(&mut self, snapshot: Snapshot) -> usize {
        let now = self.now();
        let mut live: Vec<(String, CacheEntry)> = snapshot
            .entries
            .into_iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .collect();
        live.sort_by_key(|(_, entry)| (entry.last_accessed_at, entry.created_at));

        for (key, entry) in live {
            if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
                if let Some(victim) = self.recency.pop_oldest() {
                    self.entries.remove(&victim);
                }
            }
            self.recency.touch(&key);
            self.entries.insert(key, entry);
        }
        self.entries.len()
    }
}
