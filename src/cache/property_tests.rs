//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check capacity, ordering and bookkeeping invariants
//! over arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::cache::{EvictCallback, LruCache};

// == Strategies ==
/// Small key space so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..32
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: u32 },
    Get { key: u8 },
    Peek { key: u8 },
    Remove { key: u8 },
    RemoveOldest,
    GetOldest,
    Resize { capacity: usize },
    Purge,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Peek { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        1 => Just(CacheOp::RemoveOldest),
        1 => Just(CacheOp::GetOldest),
        1 => (1usize..16).prop_map(|capacity| CacheOp::Resize { capacity }),
        1 => Just(CacheOp::Purge),
    ]
}

fn counting_callback() -> (Option<EvictCallback<u8, u32>>, Arc<Mutex<usize>>) {
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let callback: EvictCallback<u8, u32> = Box::new(move |_: &u8, _: &u32| {
        *sink.lock().unwrap() += 1;
    });
    (Some(callback), count)
}

/// Reference model: keys ordered oldest first.
fn model_touch(model: &mut VecDeque<u8>, key: u8) {
    model.retain(|k| *k != key);
    model.push_back(key);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Len never exceeds capacity, the index and recency list stay in
    // bijection, and every physical removal is reported exactly once.
    #[test]
    fn prop_invariants_hold(
        capacity in 1usize..16,
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let (on_evict, removed) = counting_callback();
        let mut cache = LruCache::new(capacity, on_evict).unwrap();
        let mut inserted = 0usize;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    if !cache.contains(&key) {
                        inserted += 1;
                    }
                    cache.put(key, value);
                }
                CacheOp::Get { key } => {
                    cache.get(&key);
                }
                CacheOp::Peek { key } => {
                    cache.peek(&key);
                }
                CacheOp::Remove { key } => {
                    cache.remove(&key);
                }
                CacheOp::RemoveOldest => {
                    cache.remove_oldest();
                }
                CacheOp::GetOldest => {
                    cache.get_oldest();
                }
                CacheOp::Resize { capacity } => {
                    cache.resize(capacity);
                }
                CacheOp::Purge => cache.purge(),
            }

            cache.check_invariants();
            prop_assert!(
                cache.len() <= cache.capacity(),
                "Cache size {} exceeds capacity {}",
                cache.len(),
                cache.capacity()
            );
            prop_assert_eq!(
                inserted,
                cache.len() + *removed.lock().unwrap(),
                "Every inserted entry is either held or reported removed"
            );
        }
    }

    // Without TTLs the cache matches a simple ordered-list model.
    #[test]
    fn prop_matches_reference_model(
        capacity in 1usize..10,
        ops in prop::collection::vec(cache_op_strategy(), 1..150)
    ) {
        let mut cache = LruCache::new(capacity, None).unwrap();
        let mut model: VecDeque<u8> = VecDeque::new();
        let mut model_capacity = capacity;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let evicted = cache.put(key, value);
                    let existed = model.contains(&key);
                    model_touch(&mut model, key);
                    let model_evicted = !existed && model.len() > model_capacity;
                    if model_evicted {
                        model.pop_front();
                    }
                    prop_assert_eq!(evicted, model_evicted);
                }
                CacheOp::Get { key } => {
                    let hit = cache.get(&key).is_some();
                    prop_assert_eq!(hit, model.contains(&key));
                    if hit {
                        model_touch(&mut model, key);
                    }
                }
                CacheOp::Peek { key } => {
                    prop_assert_eq!(cache.peek(&key).is_some(), model.contains(&key));
                }
                CacheOp::Remove { key } => {
                    let present = model.contains(&key);
                    model.retain(|k| *k != key);
                    prop_assert_eq!(cache.remove(&key), present);
                }
                CacheOp::RemoveOldest => {
                    let expected = model.pop_front();
                    prop_assert_eq!(cache.remove_oldest().map(|(k, _)| k), expected);
                }
                CacheOp::GetOldest => {
                    let expected = model.front().copied();
                    prop_assert_eq!(cache.get_oldest().map(|(k, _)| *k), expected);
                }
                CacheOp::Resize { capacity } => {
                    let expected = model.len().saturating_sub(capacity);
                    for _ in 0..expected {
                        model.pop_front();
                    }
                    model_capacity = capacity;
                    prop_assert_eq!(cache.resize(capacity), expected);
                }
                CacheOp::Purge => {
                    model.clear();
                    cache.purge();
                }
            }

            let keys: Vec<u8> = model.iter().copied().collect();
            prop_assert_eq!(cache.keys(), keys);
        }
    }

    // N+1 distinct puts into a cache of N evict the first key.
    #[test]
    fn prop_lru_eviction_order(keys in prop::collection::hash_set(key_strategy(), 2..16)) {
        let keys: Vec<u8> = keys.into_iter().collect();
        let (last, initial) = keys.split_last().unwrap();
        let capacity = initial.len();

        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let on_evict: EvictCallback<u8, u32> = Box::new(move |k: &u8, v: &u32| {
            sink.lock().unwrap().push((*k, *v));
        });
        let mut cache = LruCache::new(capacity, Some(on_evict)).unwrap();

        for key in initial {
            cache.put(*key, u32::from(*key) * 10);
        }
        prop_assert!(cache.put(*last, 0));

        let oldest = initial[0];
        prop_assert_eq!(evicted.lock().unwrap().clone(), vec![(oldest, u32::from(oldest) * 10)]);
        prop_assert!(!cache.contains(&oldest));
        prop_assert!(cache.contains(last));
    }

    // A Get on the oldest key shifts eviction to the next oldest.
    #[test]
    fn prop_lru_access_tracking(keys in prop::collection::hash_set(key_strategy(), 4..16)) {
        let keys: Vec<u8> = keys.into_iter().collect();
        let (new_key, initial) = keys.split_last().unwrap();
        let mut cache = LruCache::new(initial.len(), None).unwrap();

        for key in initial {
            cache.put(*key, 0u32);
        }
        prop_assert!(cache.get(&initial[0]).is_some());
        cache.put(*new_key, 0);

        prop_assert!(cache.contains(&initial[0]));
        prop_assert!(!cache.contains(&initial[1]));
    }

    // Shrinking evicts exactly the excess, oldest first.
    #[test]
    fn prop_resize_shrink(
        keys in prop::collection::hash_set(key_strategy(), 1..20),
        new_capacity in 1usize..20
    ) {
        let keys: Vec<u8> = keys.into_iter().collect();
        let mut cache = LruCache::new(keys.len(), None).unwrap();
        for key in &keys {
            cache.put(*key, 0u32);
        }

        let expected = keys.len().saturating_sub(new_capacity);
        prop_assert_eq!(cache.resize(new_capacity), expected);
        prop_assert_eq!(cache.len(), keys.len() - expected);

        let survivors: HashSet<u8> = cache.keys().into_iter().collect();
        let expected_survivors: HashSet<u8> = keys[expected..].iter().copied().collect();
        prop_assert_eq!(survivors, expected_survivors);
    }
}
