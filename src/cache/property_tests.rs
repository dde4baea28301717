//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's invariants over arbitrary operation
//! sequences.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::Strategy as TtlStrategy;
use crate::cache::{CacheStore, Expiry, Invalidation, ManualClock, StrategyTable};
use crate::client::{cache_key, Method, RequestOptions};
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

fn new_store(max_entries: usize) -> (CacheStore, ManualClock) {
    let clock = ManualClock::new(1_000_000);
    let config = CacheConfig {
        max_entries,
        ..CacheConfig::default()
    };
    let store = CacheStore::with_parts(config, StrategyTable::default(), Arc::new(clock.clone()));
    (store, clock)
}

// == Strategies ==
/// Generates namespaced cache keys such as `villa:ab12`
fn valid_key_strategy() -> impl Strategy<Value = String> {
    ("(villa|user|admin)", "[a-z0-9]{1,8}").prop_map(|(ns, id)| format!("{}:{}", ns, id))
}

/// Generates JSON payloads of varying shape and size
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,64}".prop_map(Value::from),
        ("[a-zA-Z ]{1,32}", 1u32..12)
            .prop_map(|(name, rooms)| json!({"name": name, "rooms": rooms})),
        "[a-z]{0,2048}".prop_map(|blob| json!({"description": blob})),
    ]
}

fn ttl_strategy() -> impl Strategy<Value = TtlStrategy> {
    prop::sample::select(TtlStrategy::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value },
    Get { key: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hits, misses and writes match a reference model of the operations.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (mut store, _) = new_store(TEST_MAX_ENTRIES);
        let mut model: HashMap<String, Value> = HashMap::new();
        let (mut hits, mut misses, mut writes) = (0u64, 0u64, 0u64);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value.clone(), Expiry::Default);
                    model.insert(key, value);
                    writes += 1;
                }
                CacheOp::Get { key } => {
                    let got = store.get(&key);
                    prop_assert_eq!(&got, &model.get(&key).cloned());
                    if got.is_some() { hits += 1 } else { misses += 1 }
                }
                CacheOp::Invalidate { key } => {
                    store.invalidate(&Invalidation::key(key.as_str()));
                    model.remove(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.misses, misses);
        prop_assert_eq!(stats.writes, writes);
        prop_assert_eq!(stats.entries, model.len());

        let expected_rate = if hits + misses == 0 { 0.0 } else { hits as f64 / (hits + misses) as f64 };
        prop_assert!((stats.hit_rate - expected_rate).abs() < 1e-12);
    }

    // A value read back before expiry equals the value stored, packed or not.
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in value_strategy(),
        strategy in ttl_strategy(),
    ) {
        let (mut store, clock) = new_store(TEST_MAX_ENTRIES);
        store.set(key.clone(), value.clone(), strategy);

        clock.advance(strategy.default_ttl() - Duration::from_millis(1));
        prop_assert_eq!(store.get(&key), Some(value));
    }

    // Once the strategy TTL has elapsed the key reads as absent and is gone.
    #[test]
    fn prop_expiry_removes_on_read(
        key in valid_key_strategy(),
        value in value_strategy(),
        strategy in ttl_strategy(),
    ) {
        let (mut store, clock) = new_store(TEST_MAX_ENTRIES);
        store.set(key.clone(), value, strategy);

        clock.advance(strategy.default_ttl());
        prop_assert_eq!(store.get(&key), None);
        prop_assert_eq!(store.stats().entries, 0);
    }

    // Exact invalidation removes only that key.
    #[test]
    fn prop_invalidate_exact_key_is_isolated(
        keys in prop::collection::hash_set(valid_key_strategy(), 2..20),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let (mut store, _) = new_store(TEST_MAX_ENTRIES);
        for key in &keys {
            store.set(key.clone(), json!(key), Expiry::Default);
        }

        prop_assert_eq!(store.invalidate(&Invalidation::key(keys[0].as_str())), 1);
        prop_assert!(!store.contains(&keys[0]));
        for key in keys.iter().skip(1) {
            prop_assert!(store.contains(key));
        }
    }

    // Pattern invalidation removes exactly the matching keys.
    #[test]
    fn prop_invalidate_pattern_removes_exactly_matches(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..30),
        namespace in "(villa|user|admin)",
    ) {
        let (mut store, _) = new_store(TEST_MAX_ENTRIES);
        for key in &keys {
            store.set(key.clone(), json!(1), Expiry::Default);
        }

        let glob = Invalidation::glob(&format!("{}:*", namespace)).unwrap();
        let expected: HashSet<&String> = keys.iter().filter(|k| k.starts_with(&format!("{}:", namespace))).collect();
        prop_assert_eq!(store.invalidate(&glob), expected.len());

        for key in &keys {
            prop_assert_eq!(store.contains(key), !expected.contains(key));
        }
    }

    // The store never grows past capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((valid_key_strategy(), value_strategy()), 1..200)
    ) {
        let max_entries = 25;
        let (mut store, _) = new_store(max_entries);

        for (key, value) in entries {
            store.set(key, value, TtlStrategy::Dynamic);
            prop_assert!(store.len() <= max_entries);
        }
    }

    // A full store evicts exactly the least recently accessed entry.
    #[test]
    fn prop_lru_victim_is_least_recently_accessed(
        keys in prop::collection::hash_set(valid_key_strategy(), 3..12),
        reads in prop::collection::vec(0usize..64, 0..30),
        new_key in "new:[a-z]{1,6}",
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let capacity = keys.len();
        let (mut store, clock) = new_store(capacity);

        // Recency model: most recent at the back
        let mut order: Vec<String> = Vec::new();
        for key in &keys {
            store.set(key.clone(), json!(key), Expiry::Default);
            order.push(key.clone());
            clock.advance(Duration::from_millis(1));
        }
        for index in reads {
            let key = &keys[index % capacity];
            prop_assert!(store.get(key).is_some());
            order.retain(|k| k != key);
            order.push(key.clone());
            clock.advance(Duration::from_millis(1));
        }

        let victim = order[0].clone();
        let oldest_access = keys
            .iter()
            .map(|k| store.entry(k).unwrap().last_accessed_at)
            .min()
            .unwrap();
        prop_assert_eq!(store.entry(&victim).unwrap().last_accessed_at, oldest_access);

        store.set(new_key.clone(), json!("new"), Expiry::Default);

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(!store.contains(&victim));
        prop_assert!(store.contains(&new_key));
        for key in order.iter().skip(1) {
            prop_assert!(store.contains(key));
        }
    }

    // Snapshot then restore reproduces every live entry.
    #[test]
    fn prop_snapshot_restore_roundtrip(
        entries in prop::collection::hash_map(valid_key_strategy(), value_strategy(), 0..30)
    ) {
        let (mut original, _) = new_store(TEST_MAX_ENTRIES);
        for (key, value) in &entries {
            original.set(key.clone(), value.clone(), TtlStrategy::Static);
        }

        let (mut restored, _) = new_store(TEST_MAX_ENTRIES);
        restored.restore(original.snapshot());

        prop_assert_eq!(restored.len(), entries.len());
        for (key, value) in entries {
            prop_assert_eq!(restored.get(&key), Some(value));
        }
    }

    // Equal logical reads share a key; any difference separates them.
    #[test]
    fn prop_cache_key_is_injective(
        resource_a in "/[a-z]{1,6}(/[0-9]{1,3})?",
        resource_b in "/[a-z]{1,6}(/[0-9]{1,3})?",
        query_a in prop::collection::btree_map("[a-z\"=&:,]{1,4}", "[a-z0-9\"=&:,]{0,4}", 0..3),
        query_b in prop::collection::btree_map("[a-z\"=&:,]{1,4}", "[a-z0-9\"=&:,]{0,4}", 0..3),
    ) {
        let a = RequestOptions { query: query_a.clone(), ..RequestOptions::default() };
        let b = RequestOptions { query: query_b.clone(), ..RequestOptions::default() };

        let key_a = cache_key(Method::Get, &resource_a, &a);
        let key_b = cache_key(Method::Get, &resource_b, &b);

        prop_assert_eq!(key_a == key_b, resource_a == resource_b && query_a == query_b);
        prop_assert_eq!(key_a, cache_key(Method::Get, &resource_a, &a.clone().strategy(TtlStrategy::Static)));
    }
}
