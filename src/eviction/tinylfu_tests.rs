use std::sync::Arc;

use parking_lot::Mutex;

use super::sketch::CountMinSketch;
use super::tinylfu::TinyLfuCache;

fn embedding(seed: i64) -> Vec<f32> {
    vec![seed as f32]
}

#[test]
fn test_cms_conservative_update_counts_single_key() {
    let mut cms = CountMinSketch::with_geometry(64, 4, 1_000_000);
    for _ in 0..5 {
        cms.add(42);
    }
    assert_eq!(cms.estimate(42), 5);
    assert_eq!(cms.estimate(7), 0);
}

#[test]
fn test_cms_decay_halves_counters() {
    let mut cms = CountMinSketch::with_geometry(64, 4, 4);
    for _ in 0..3 {
        cms.add(1);
    }
    assert_eq!(cms.estimate(1), 3);
    // The fourth add crosses the decay interval: counters are right-shifted.
    cms.add(1);
    assert_eq!(cms.estimate(1), 2);
}

#[test]
fn test_first_put_lands_in_window() {
    let cache = TinyLfuCache::new(100);
    cache.put(1, embedding(1));
    assert_eq!(cache.window_len(), 1);
    assert!(cache.contains(1));
    assert!(cache.estimate(1) >= 1);
}

#[test]
fn test_window_overflow_admits_winner_to_probation() {
    // maxsize 100 → window 1. The second put overflows the window; on a
    // frequency tie the new key wins and the victim is dropped.
    let cache = TinyLfuCache::new(100);
    cache.put(1, embedding(1));
    cache.put(2, embedding(2));

    assert!(!cache.contains(1));
    assert!(cache.contains(2));
    assert_eq!(cache.probation_len(), 1);
    assert_eq!(cache.window_len(), 0);
}

#[test]
fn test_frequent_victim_beats_cold_newcomer() {
    let cache = TinyLfuCache::new(100);
    cache.put(1, embedding(1));
    cache.put(1, embedding(1)); // estimate(1) = 2, still in window
    cache.put(2, embedding(2)); // estimate(2) = 1 < 2: victim 1 wins

    assert!(cache.contains(1));
    assert!(!cache.contains(2));
    assert_eq!(cache.probation_len(), 1);
}

#[test]
fn test_probation_hit_promotes_to_protected() {
    let cache = TinyLfuCache::new(100);
    cache.put(1, embedding(1));
    cache.put(2, embedding(2)); // 2 → probation

    assert_eq!(cache.get(2), Some(embedding(2)));
    assert_eq!(cache.probation_len(), 0);
    assert_eq!(cache.protected_len(), 1);
    assert!(cache.in_protected(2));
}

#[test]
fn test_window_hit_refreshes_and_returns_value() {
    let cache = TinyLfuCache::new(100);
    cache.put(1, embedding(1));
    assert_eq!(cache.get(1), Some(embedding(1)));
    assert_eq!(cache.window_len(), 1);
}

#[test]
fn test_pop_removes_from_any_segment() {
    let cache = TinyLfuCache::new(100);
    cache.put(1, embedding(1));
    cache.put(2, embedding(2)); // probation
    cache.put(3, embedding(3)); // window
    cache.get(2); // protected

    assert_eq!(cache.pop(2), Some(embedding(2)));
    assert_eq!(cache.pop(3), Some(embedding(3)));
    assert_eq!(cache.pop(99), None);
    assert!(!cache.contains(2));
    assert!(!cache.contains(3));
}

#[test]
fn test_clear_empties_every_segment() {
    let cache = TinyLfuCache::new(100);
    for id in 1..=20 {
        cache.put(id, embedding(id));
    }
    cache.get(2);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_eviction_callback_reports_dropped_keys() {
    let evicted: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&evicted);

    let cache = TinyLfuCache::new(100);
    cache.subscribe(Box::new(move |keys| {
        seen.lock().extend_from_slice(keys);
    }));

    cache.put(1, embedding(1));
    cache.put(2, embedding(2)); // tie: 2 wins, 1 dropped

    assert_eq!(evicted.lock().as_slice(), &[1]);
}

#[test]
fn test_capacity_bounds_hold_under_churn() {
    let cache = TinyLfuCache::new(50);
    for round in 0..10 {
        for id in 0..100i64 {
            cache.put(id, embedding(id));
            if id % 3 == 0 {
                cache.get(id - round);
            }
        }
        assert!(cache.len() <= 50);
    }
}

#[test]
fn test_high_frequency_keys_displace_singletons() {
    // 200 one-shot keys, then 200 keys accessed ten times each (two writes,
    // eight reads, round-robin). The protected segment must end up owned by
    // the frequent cohort and the sketch must rank them at least as high as
    // any singleton.
    let cache = TinyLfuCache::new(100);

    for id in 0..200i64 {
        cache.put(id, embedding(id));
    }

    let frequent = 1000..1200i64;
    for _ in 0..2 {
        for id in frequent.clone() {
            cache.put(id, embedding(id));
        }
    }
    for _ in 0..8 {
        for id in frequent.clone() {
            cache.get(id);
        }
    }

    assert!(cache.len() <= 100);
    assert!(cache.window_len() <= 1);
    assert!(cache.protected_len() > 0);

    for id in 0..200i64 {
        assert!(!cache.in_protected(id), "singleton {id} reached protected");
    }

    for id in frequent.clone() {
        assert!(cache.estimate(id) >= cache.estimate(id - 1000));
    }
}
