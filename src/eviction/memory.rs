//! Per-model hot set.
//!
//! Maps each model scope to its own policy instance (created on first
//! access). Values are embeddings keyed by scalar-tier id; eviction here is
//! advisory only, the scalar and vector tiers stay authoritative.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::arc::ArcCache;
use super::tinylfu::TinyLfuCache;
use super::{EvictionCallback, PolicyKind};

/// Subscriber for eviction events across all model scopes.
pub type EvictionListener = Arc<dyn Fn(&str, &[i64]) + Send + Sync>;

/// ARC instances are not internally synchronized, so they sit behind a
/// per-model mutex; W-TinyLFU carries its own reader/writer lock.
enum PolicyCell {
    Arc(Mutex<ArcCache>),
    TinyLfu(TinyLfuCache),
}

impl PolicyCell {
    fn get(&self, id: i64) -> Option<Vec<f32>> {
        match self {
            PolicyCell::Arc(cache) => cache.lock().get(id),
            PolicyCell::TinyLfu(cache) => cache.get(id),
        }
    }

    fn put(&self, id: i64, embedding: Vec<f32>) {
        match self {
            PolicyCell::Arc(cache) => cache.lock().put(id, embedding),
            PolicyCell::TinyLfu(cache) => cache.put(id, embedding),
        }
    }

    fn pop(&self, id: i64) -> Option<Vec<f32>> {
        match self {
            PolicyCell::Arc(cache) => cache.lock().pop(id),
            PolicyCell::TinyLfu(cache) => cache.pop(id),
        }
    }

    fn clear(&self) {
        match self {
            PolicyCell::Arc(cache) => cache.lock().clear(),
            PolicyCell::TinyLfu(cache) => cache.clear(),
        }
    }

    fn len(&self) -> usize {
        match self {
            PolicyCell::Arc(cache) => cache.lock().len(),
            PolicyCell::TinyLfu(cache) => cache.len(),
        }
    }
}

/// Hot-set cache partitioned by model scope.
pub struct MemoryCache {
    policy: PolicyKind,
    maxsize: usize,
    caches: RwLock<HashMap<String, Arc<PolicyCell>>>,
    listener: Option<EvictionListener>,
}

impl MemoryCache {
    /// Creates an empty cache; each model gets a `policy` instance of
    /// capacity `maxsize` on first access.
    pub fn new(policy: PolicyKind, maxsize: usize) -> Self {
        Self {
            policy,
            maxsize,
            caches: RwLock::new(HashMap::new()),
            listener: None,
        }
    }

    /// Subscribes the eviction listener. Applies to policy instances created
    /// afterwards, so subscribe before first use.
    pub fn subscribe(&mut self, listener: EvictionListener) {
        self.listener = Some(listener);
    }

    /// Configured policy.
    pub fn policy(&self) -> PolicyKind {
        self.policy
    }

    fn get_cache(&self, model: &str) -> Arc<PolicyCell> {
        if let Some(cache) = self.caches.read().get(model) {
            return Arc::clone(cache);
        }

        let mut caches = self.caches.write();
        let cache = caches.entry(model.to_string()).or_insert_with(|| {
            debug!(model, policy = ?self.policy, "Creating hot-set policy instance");
            Arc::new(self.build_policy(model))
        });
        Arc::clone(cache)
    }

    fn build_policy(&self, model: &str) -> PolicyCell {
        let callback = self.listener.as_ref().map(|listener| {
            let listener = Arc::clone(listener);
            let model = model.to_string();
            Box::new(move |ids: &[i64]| listener(&model, ids)) as EvictionCallback
        });

        match self.policy {
            PolicyKind::Arc => {
                let mut cache = ArcCache::new(self.maxsize);
                if let Some(callback) = callback {
                    cache.subscribe(callback);
                }
                PolicyCell::Arc(Mutex::new(cache))
            }
            PolicyKind::WTinyLfu => {
                let cache = TinyLfuCache::new(self.maxsize);
                if let Some(callback) = callback {
                    cache.subscribe(callback);
                }
                PolicyCell::TinyLfu(cache)
            }
        }
    }

    /// Looks up an embedding, refreshing its standing in the policy.
    pub fn get(&self, id: i64, model: &str) -> Option<Vec<f32>> {
        self.get_cache(model).get(id)
    }

    /// Records a batch of `(id, embedding)` pairs for `model`.
    pub fn batch_put(&self, pairs: Vec<(i64, Vec<f32>)>, model: &str) {
        let cache = self.get_cache(model);
        for (id, embedding) in pairs {
            cache.put(id, embedding);
        }
    }

    /// Removes one id from `model`'s hot set, if that hot set exists.
    pub fn pop(&self, id: i64, model: &str) -> Option<Vec<f32>> {
        let cache = {
            let caches = self.caches.read();
            caches.get(model).map(Arc::clone)
        };
        cache.and_then(|cache| cache.pop(id))
    }

    /// Clears `model`'s hot set.
    pub fn clear(&self, model: &str) {
        let cache = {
            let caches = self.caches.read();
            caches.get(model).map(Arc::clone)
        };
        if let Some(cache) = cache {
            cache.clear();
        }
    }

    /// Number of live entries for `model`.
    pub fn len(&self, model: &str) -> usize {
        let caches = self.caches.read();
        caches.get(model).map(|cache| cache.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("policy", &self.policy)
            .field("maxsize", &self.maxsize)
            .field("models", &self.caches.read().len())
            .finish()
    }
}
