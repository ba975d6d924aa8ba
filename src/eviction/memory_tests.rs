use std::sync::Arc;

use parking_lot::Mutex;

use super::memory::MemoryCache;
use super::PolicyKind;

fn embedding(seed: i64) -> Vec<f32> {
    vec![seed as f32, 0.5]
}

#[test]
fn test_batch_put_and_get() {
    let cache = MemoryCache::new(PolicyKind::Arc, 16);
    cache.batch_put(vec![(1, embedding(1)), (2, embedding(2))], "gpt_4_1");

    assert_eq!(cache.get(1, "gpt_4_1"), Some(embedding(1)));
    assert_eq!(cache.get(2, "gpt_4_1"), Some(embedding(2)));
    assert_eq!(cache.len("gpt_4_1"), 2);
}

#[test]
fn test_models_are_isolated() {
    let cache = MemoryCache::new(PolicyKind::Arc, 16);
    cache.batch_put(vec![(1, embedding(1))], "model_a");

    assert_eq!(cache.get(1, "model_b"), None);
    assert_eq!(cache.len("model_b"), 0);
    assert_eq!(cache.get(1, "model_a"), Some(embedding(1)));
}

#[test]
fn test_pop_removes_single_entry() {
    let cache = MemoryCache::new(PolicyKind::WTinyLfu, 16);
    cache.batch_put(vec![(1, embedding(1))], "m");

    assert_eq!(cache.pop(1, "m"), Some(embedding(1)));
    assert_eq!(cache.get(1, "m"), None);
    // Popping from a model that has no hot set is a no-op.
    assert_eq!(cache.pop(1, "never_seen"), None);
}

#[test]
fn test_clear_empties_one_model_only() {
    let cache = MemoryCache::new(PolicyKind::Arc, 16);
    cache.batch_put(vec![(1, embedding(1))], "a");
    cache.batch_put(vec![(2, embedding(2))], "b");

    cache.clear("a");
    assert_eq!(cache.len("a"), 0);
    assert_eq!(cache.get(2, "b"), Some(embedding(2)));
}

#[test]
fn test_listener_receives_model_and_ids() {
    let events: Arc<Mutex<Vec<(String, Vec<i64>)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&events);

    let mut cache = MemoryCache::new(PolicyKind::Arc, 2);
    cache.subscribe(Arc::new(move |model: &str, ids: &[i64]| {
        seen.lock().push((model.to_string(), ids.to_vec()));
    }));

    cache.batch_put(
        vec![(1, embedding(1)), (2, embedding(2)), (3, embedding(3))],
        "m",
    );

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "m");
    assert_eq!(events[0].1, vec![1]);
}

#[test]
fn test_tinylfu_policy_round_trip() {
    let cache = MemoryCache::new(PolicyKind::WTinyLfu, 64);
    cache.batch_put(vec![(7, embedding(7))], "m");
    assert_eq!(cache.get(7, "m"), Some(embedding(7)));
}
