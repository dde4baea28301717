//! Shared Cache Handle
//!
//! Cloneable handle binding one [`CacheStore`] to its durable storage.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::{CacheStats, CacheStore, EntryInfo, Expiry, Invalidation, Snapshot, StrategyTable};
use crate::config::{CacheConfig, CacheConfigPatch};
use crate::error::Result;
use crate::storage::DurableStorage;

type FlightMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

// == Cache ==
/// Process-wide cache, constructed once and passed to whoever needs it.
///
/// The store lock is only held inside synchronous sections, never across an
/// `.await`, so interleaved tasks always observe whole operations.
#[derive(Debug, Clone)]
pub struct Cache {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    store: Mutex<CacheStore>,
    storage: Option<Arc<dyn DurableStorage>>,
    /// Per-key locks used when single-flight is enabled
    flights: Mutex<FlightMap>,
}

// == Builder ==
/// Assembles a [`Cache`], hydrating it from storage when persistence is on.
#[derive(Debug)]
pub struct CacheBuilder {
    config: CacheConfig,
    strategies: StrategyTable,
    clock: Arc<dyn Clock>,
    storage: Option<Arc<dyn DurableStorage>>,
}

impl CacheBuilder {
    pub fn strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn DurableStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn build(self) -> Cache {
        let mut store = CacheStore::with_parts(self.config, self.strategies, self.clock);

        if store.config().persist {
            if let Some(storage) = &self.storage {
                hydrate(&mut store, storage.as_ref());
            }
        }

        Cache {
            inner: Arc::new(Shared {
                store: Mutex::new(store),
                storage: self.storage,
                flights: Mutex::default(),
            }),
        }
    }
}

/// Loads the snapshot into a fresh store. Failures are logged and the
/// offending snapshot dropped; the store then simply starts empty.
fn hydrate(store: &mut CacheStore, storage: &dyn DurableStorage) {
    let slot = store.config().snapshot_slot.clone();
    match Snapshot::load(storage, &slot, store.now()) {
        Ok(Some(snapshot)) => {
            let held = store.restore(snapshot);
            info!("Hydrated cache with {} entries from snapshot", held);
        }
        Ok(None) => debug!("No usable cache snapshot found"),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable cache snapshot");
            if let Err(e) = storage.remove(&slot) {
                warn!(error = %e, "Failed to remove unreadable cache snapshot");
            }
        }
    }
}

impl Cache {
    /// Starts building a cache with `config`, the system clock and no storage.
    pub fn builder(config: CacheConfig) -> CacheBuilder {
        CacheBuilder {
            config,
            strategies: StrategyTable::default(),
            clock: Arc::new(SystemClock),
            storage: None,
        }
    }

    /// In-memory cache on the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::builder(config).build()
    }

    fn store(&self) -> MutexGuard<'_, CacheStore> {
        self.inner.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Reads and Writes ==
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store().get(key)
    }

    pub fn set(&self, key: impl Into<String>, value: Value, expiry: impl Into<Expiry>) {
        self.store().set(key, value, expiry);
    }

    /// Whether `key` holds a live entry. Does not count as a read.
    pub fn contains(&self, key: &str) -> bool {
        self.store().contains(key)
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, or awaits `supplier`, caches its
    /// result and returns it.
    ///
    /// A failing supplier leaves the key absent and its error is returned
    /// as is. Without single-flight, concurrent misses on the same key each
    /// run their own supplier and the last to finish wins.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        supplier: F,
        expiry: impl Into<Expiry>,
    ) -> std::result::Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
    {
        let expiry = expiry.into();
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        if !self.store().config().single_flight {
            let value = supplier().await?;
            self.set(key, value.clone(), expiry);
            return Ok(value);
        }

        let flight = FlightGuard::join(self, key);
        let _turn = flight.turn().await;

        // Another caller may have filled the key while we waited.
        let cached = self.store().peek(key);
        match cached {
            Some(value) => Ok(value),
            None => supplier().await.map(|value| {
                self.set(key, value.clone(), expiry);
                value
            }),
        }
    }

    fn flights(&self) -> MutexGuard<'_, FlightMap> {
        self.inner.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Invalidation ==
    /// Removes the key or every key matching the pattern.
    pub fn invalidate(&self, target: impl Into<Invalidation>) -> usize {
        let target = target.into();
        let removed = self.store().invalidate(&target);
        debug!(?target, removed, "Invalidated cache entries");
        removed
    }

    /// Removes every key prefixed with `"{tag}:"`.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        self.invalidate(Invalidation::tag(tag))
    }

    // == Maintenance ==
    pub fn sweep(&self) -> usize {
        self.store().sweep()
    }

    pub fn stats(&self) -> CacheStats {
        self.store().stats()
    }

    /// Empties the cache, zeroes counters and deletes the durable snapshot.
    pub fn clear(&self) {
        let (persist, slot) = {
            let mut store = self.store();
            store.clear();
            (store.config().persist, store.config().snapshot_slot.clone())
        };

        if let (true, Some(storage)) = (persist, &self.inner.storage) {
            if let Err(e) = storage.remove(&slot) {
                warn!(error = %e, "Failed to remove cache snapshot");
            }
        }
        info!("Cache cleared");
    }

    pub fn configure(&self, patch: &CacheConfigPatch) {
        self.store().configure(patch);
        debug!(?patch, "Cache reconfigured");
    }

    pub fn config(&self) -> CacheConfig {
        self.store().config().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.store().keys()
    }

    /// Strategy, remaining TTL and size of every live entry.
    pub fn describe(&self) -> Vec<EntryInfo> {
        self.store().describe()
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    // == Persist ==
    /// Writes a snapshot of the live entries to durable storage.
    ///
    /// Called when the host goes to background or shuts down. Returns
    /// whether a snapshot was written; failures are logged, never raised.
    pub fn persist(&self) -> bool {
        match self.try_persist() {
            Ok(written) => written,
            Err(e) => {
                warn!(error = %e, "Failed to persist cache snapshot");
                false
            }
        }
    }

    /// Like [`persist`](Self::persist) but reports storage failures, for
    /// callers that asked for a flush explicitly.
    pub fn try_persist(&self) -> Result<bool> {
        let Some(storage) = &self.inner.storage else {
            return Ok(false);
        };

        let (snapshot, slot) = {
            let store = self.store();
            if !store.config().persist {
                return Ok(false);
            }
            (store.snapshot(), store.config().snapshot_slot.clone())
        };

        snapshot.save(storage.as_ref(), &slot)?;
        debug!("Persisted cache snapshot with {} entries", snapshot.entries.len());
        Ok(true)
    }
}

// == Flight Guard ==
/// One caller's membership in a key's flight.
///
/// Dropping it, whether the call finished or was cancelled, releases the
/// caller's handle and removes the flight once nobody else is queued on it.
struct FlightGuard<'a> {
    cache: &'a Cache,
    key: &'a str,
    flight: Option<Arc<tokio::sync::Mutex<()>>>,
}

impl<'a> FlightGuard<'a> {
    fn join(cache: &'a Cache, key: &'a str) -> Self {
        let flight = cache.flights().entry(key.to_string()).or_default().clone();
        Self {
            cache,
            key,
            flight: Some(flight),
        }
    }

    async fn turn(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match &self.flight {
            Some(flight) => Some(flight.lock().await),
            None => None,
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut flights = self.cache.flights();
        if let Some(flight) = self.flight.take() {
            // Handles are only cloned and released under the map lock, so
            // a count of two means the map and this guard are the last.
            let last = Arc::strong_count(&flight) == 2
                && flights
                    .get(self.key)
                    .is_some_and(|current| Arc::ptr_eq(current, &flight));
            if last {
                flights.remove(self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, Strategy};
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn persistent(storage: Arc<MemoryStorage>, clock: &ManualClock) -> Cache {
        Cache::builder(CacheConfig::default())
            .clock(clock.clone())
            .storage(storage)
            .build()
    }

    #[tokio::test]
    async fn test_get_or_compute_calls_supplier_once() {
        let cache = Cache::new(CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..2 {
            let value = cache
                .get_or_compute(
                    "villa:list",
                    move || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(json!(["Villa A", "Villa B"]))
                    },
                    Strategy::Dynamic,
                )
                .await
                .unwrap();
            assert_eq!(value, json!(["Villa A", "Villa B"]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_or_compute_serves_cached_value_without_supplier() {
        let cache = Cache::new(CacheConfig::default());
        cache.set("villa:1", json!({"name": "Villa A"}), Strategy::Static);

        let value = tokio_test::assert_ok!(tokio_test::block_on(cache.get_or_compute(
            "villa:1",
            || async { Err::<Value, _>("supplier must not run") },
            Strategy::Static,
        )));
        assert_eq!(value, json!({"name": "Villa A"}));
    }

    #[tokio::test]
    async fn test_get_or_compute_does_not_cache_errors() {
        let cache = Cache::new(CacheConfig::default());

        let result = cache
            .get_or_compute("villa:1", || async { Err::<Value, _>("upstream down") }, Strategy::Dynamic)
            .await;

        assert_eq!(result, Err("upstream down"));
        assert!(!cache.contains("villa:1"));
    }

    #[tokio::test]
    async fn test_concurrent_misses_race_without_single_flight() {
        let cache = Cache::new(CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let supplier = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(json!("fresh"))
        };

        let (a, b) = tokio::join!(
            cache.get_or_compute("villa:1", supplier, Expiry::Default),
            cache.get_or_compute("villa:1", supplier, Expiry::Default),
        );

        assert_eq!(a.unwrap(), json!("fresh"));
        assert_eq!(b.unwrap(), json!("fresh"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_flight_coalesces_concurrent_misses() {
        let cache = Cache::new(CacheConfig {
            single_flight: true,
            ..CacheConfig::default()
        });
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let supplier = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(json!("fresh"))
        };

        let (a, b, c) = tokio::join!(
            cache.get_or_compute("villa:1", supplier, Expiry::Default),
            cache.get_or_compute("villa:1", supplier, Expiry::Default),
            cache.get_or_compute("villa:1", supplier, Expiry::Default),
        );

        assert_eq!(a.unwrap(), json!("fresh"));
        assert_eq!(b.unwrap(), json!("fresh"));
        assert_eq!(c.unwrap(), json!("fresh"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.flights().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_flight_is_cleaned_up() {
        let cache = Cache::new(CacheConfig {
            single_flight: true,
            ..CacheConfig::default()
        });

        let pending = cache.get_or_compute(
            "villa:1",
            || std::future::pending::<std::result::Result<Value, String>>(),
            Expiry::Default,
        );
        let outcome = tokio::time::timeout(Duration::from_millis(20), pending).await;

        assert!(outcome.is_err());
        assert!(cache.flights().is_empty());
        assert!(!cache.contains("villa:1"));
    }

    #[tokio::test]
    async fn test_cancelled_waiter_does_not_strand_flight() {
        let cache = Cache::new(CacheConfig {
            single_flight: true,
            ..CacheConfig::default()
        });
        let supplier = || async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok::<_, String>(json!("fresh"))
        };

        let leader = cache.get_or_compute("villa:1", supplier, Expiry::Default);
        let waiter = tokio::time::timeout(
            Duration::from_millis(10),
            cache.get_or_compute("villa:1", supplier, Expiry::Default),
        );
        let (value, waited) = tokio::join!(leader, waiter);

        assert_eq!(value.unwrap(), json!("fresh"));
        assert!(waited.is_err());
        assert!(cache.flights().is_empty());
    }

    #[test]
    fn test_persistence_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = ManualClock::new(1_000_000);

        let cache = persistent(storage.clone(), &clock);
        cache.set("villa:1", json!({"name": "Villa A"}), Strategy::Static);
        cache.set("villa:list", json!(["Villa A"]), Strategy::Dynamic);
        cache.set("availability", json!({"villa:1": true}), Strategy::Realtime);
        assert!(cache.persist());

        // Realtime entry (30s) expires before the next start
        clock.advance(Duration::from_secs(60));
        let restored = persistent(storage, &clock);

        assert_eq!(restored.get("villa:1"), Some(json!({"name": "Villa A"})));
        assert_eq!(restored.get("villa:list"), Some(json!(["Villa A"])));
        assert_eq!(restored.get("availability"), None);
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = ManualClock::new(0);

        let cache = persistent(storage.clone(), &clock);
        cache.set("villa:1", json!("A"), Strategy::Static);
        cache.persist();

        clock.advance(Duration::from_secs(25 * 60 * 60));
        let restored = persistent(storage.clone(), &clock);

        assert!(restored.is_empty());
        assert!(!storage.contains(&CacheConfig::default().snapshot_slot));
    }

    #[test]
    fn test_persist_disabled_writes_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = Cache::builder(CacheConfig {
            persist: false,
            ..CacheConfig::default()
        })
        .storage(storage.clone())
        .build();

        cache.set("villa:1", json!("A"), Strategy::Static);
        assert!(!cache.persist());
        assert!(!storage.contains(&CacheConfig::default().snapshot_slot));
    }

    #[test]
    fn test_persist_failure_is_absorbed() {
        let storage = Arc::new(MemoryStorage::with_quota(16));
        let cache = Cache::builder(CacheConfig::default())
            .storage(storage)
            .build();

        cache.set("villa:1", json!({"description": "x".repeat(64)}), Strategy::Static);
        assert!(!cache.persist());
        assert!(matches!(
            cache.try_persist(),
            Err(crate::error::CacheError::Persistence(_))
        ));
        assert!(cache.contains("villa:1"));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let slot = CacheConfig::default().snapshot_slot;
        storage.set(&slot, "not json").unwrap();

        let cache = Cache::builder(CacheConfig::default())
            .storage(storage.clone())
            .build();

        assert!(cache.is_empty());
        assert!(!storage.contains(&slot));
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = ManualClock::new(0);
        let cache = persistent(storage.clone(), &clock);

        cache.set("villa:1", json!("A"), Strategy::Static);
        cache.get("villa:1");
        cache.persist();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
        assert!(!storage.contains(&CacheConfig::default().snapshot_slot));
    }

    #[test]
    fn test_invalidate_by_tag() {
        let cache = Cache::new(CacheConfig::default());
        cache.set("villa:1", json!(1), Expiry::Default);
        cache.set("villa:2", json!(2), Expiry::Default);
        cache.set("user:me", json!({}), Expiry::Default);

        assert_eq!(cache.invalidate_by_tag("villa"), 2);
        assert_eq!(cache.keys(), vec!["user:me".to_string()]);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = Cache::new(CacheConfig::default());
        let other = cache.clone();
        other.set("villa:1", json!("A"), Expiry::Default);
        assert_eq!(cache.get("villa:1"), Some(json!("A")));
    }
}
