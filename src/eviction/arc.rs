//! Adaptive Replacement Cache.
//!
//! Keys are scalar-tier ids, values the corresponding embeddings. Four
//! ordered sets: `t1` (seen once), `t2` (seen repeatedly) and the key-only
//! ghost lists `b1` / `b2` of keys recently evicted from each. The adaptive
//! parameter `p` targets the share of the cache devoted to `t1`.
//!
//! Not internally synchronized; the owner serializes access behind a
//! per-model mutex.

use indexmap::{IndexMap, IndexSet};

use super::EvictionCallback;

/// ARC policy over `(id → embedding)` entries.
pub struct ArcCache {
    maxsize: usize,
    p: usize,
    t1: IndexMap<i64, Vec<f32>>,
    t2: IndexMap<i64, Vec<f32>>,
    b1: IndexSet<i64>,
    b2: IndexSet<i64>,
    on_evict: Option<EvictionCallback>,
}

impl ArcCache {
    /// Creates an empty cache holding at most `maxsize` live entries.
    pub fn new(maxsize: usize) -> Self {
        Self {
            maxsize,
            p: 0,
            t1: IndexMap::new(),
            t2: IndexMap::new(),
            b1: IndexSet::new(),
            b2: IndexSet::new(),
            on_evict: None,
        }
    }

    /// Subscribes the eviction event callback.
    pub fn subscribe(&mut self, on_evict: EvictionCallback) {
        self.on_evict = Some(on_evict);
    }

    /// Looks up a live entry, promoting it and adapting `p`.
    pub fn get(&mut self, key: i64) -> Option<Vec<f32>> {
        if let Some(value) = self.t1.shift_remove(&key) {
            self.t2.insert(key, value);
            self.p = self.p.saturating_sub(1);
            self.trim_ghosts();
            return self.t2.get(&key).cloned();
        }
        if let Some(value) = self.t2.shift_remove(&key) {
            self.t2.insert(key, value);
            self.p = (self.p + 1).min(self.maxsize);
            self.trim_ghosts();
            return self.t2.get(&key).cloned();
        }
        None
    }

    /// Inserts or refreshes an entry, applying the admission rules.
    pub fn put(&mut self, key: i64, value: Vec<f32>) {
        if self.t1.contains_key(&key) {
            self.t1.shift_remove(&key);
            self.t1.insert(key, value);
        } else if self.t2.contains_key(&key) {
            self.t2.shift_remove(&key);
            self.t2.insert(key, value);
        } else if self.b1.shift_remove(&key) {
            self.p = (self.p + 1).min(self.maxsize);
            self.t2.insert(key, value);
        } else if self.b2.shift_remove(&key) {
            self.p = self.p.saturating_sub(1);
            self.t2.insert(key, value);
        } else {
            self.t1.insert(key, value);
        }
        self.evict_internal();
    }

    /// Removes a key from every list, returning the live value if present.
    pub fn pop(&mut self, key: i64) -> Option<Vec<f32>> {
        if let Some(value) = self.t1.shift_remove(&key) {
            return Some(value);
        }
        if let Some(value) = self.t2.shift_remove(&key) {
            return Some(value);
        }
        self.b1.shift_remove(&key);
        self.b2.shift_remove(&key);
        None
    }

    /// `true` if `key` is live (in `t1` or `t2`).
    pub fn contains(&self, key: i64) -> bool {
        self.t1.contains_key(&key) || self.t2.contains_key(&key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    /// `true` if no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and ghost and resets `p`.
    pub fn clear(&mut self) {
        self.t1.clear();
        self.t2.clear();
        self.b1.clear();
        self.b2.clear();
        self.p = 0;
    }

    fn evict_internal(&mut self) {
        while self.t1.len() + self.t2.len() > self.maxsize {
            let from_t1 = !self.t1.is_empty() && (self.t1.len() > self.p || self.t2.is_empty());
            let evicted = if from_t1 {
                self.t1.shift_remove_index(0).map(|(key, _)| {
                    self.b1.insert(key);
                    key
                })
            } else {
                self.t2.shift_remove_index(0).map(|(key, _)| {
                    self.b2.insert(key);
                    key
                })
            };
            match evicted {
                Some(key) => self.emit(&[key]),
                None => break,
            }
        }
        self.trim_ghosts();
    }

    fn trim_ghosts(&mut self) {
        while self.b1.len() > self.maxsize - self.p {
            self.b1.shift_remove_index(0);
        }
        while self.b2.len() > self.p {
            self.b2.shift_remove_index(0);
        }
    }

    fn emit(&self, keys: &[i64]) {
        if let Some(on_evict) = &self.on_evict {
            on_evict(keys);
        }
    }

    /// Current adaptive target for `t1`.
    pub fn p(&self) -> usize {
        self.p
    }

    /// Configured capacity.
    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    /// Length of the recency list.
    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    /// Length of the frequency list.
    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    /// Length of the recency ghost list.
    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    /// Length of the frequency ghost list.
    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// `true` if the recency ghost list remembers `key`.
    pub fn b1_contains(&self, key: i64) -> bool {
        self.b1.contains(&key)
    }

    /// `true` if the frequency ghost list remembers `key`.
    pub fn b2_contains(&self, key: i64) -> bool {
        self.b2.contains(&key)
    }
}

impl std::fmt::Debug for ArcCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcCache")
            .field("maxsize", &self.maxsize)
            .field("p", &self.p)
            .field("t1", &self.t1.len())
            .field("t2", &self.t2.len())
            .field("b1", &self.b1.len())
            .field("b2", &self.b2.len())
            .finish()
    }
}
