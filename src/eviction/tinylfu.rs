//! Windowed TinyLFU.
//!
//! Three sub-caches: an LRU admission `window` (~1% of capacity), and the
//! main area split into LFU-ordered `probation` and `protected` segments. A
//! Count-Min Sketch arbitrates admission when the window overflows: the
//! higher-frequency of (new key, window victim) enters probation, the loser
//! is dropped.
//!
//! Mutations run under an internal writer lock; frequency estimates and size
//! queries take the reader lock.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::EvictionCallback;
use super::sketch::CountMinSketch;
use crate::constants::TINYLFU_WINDOW_PCT;

use indexmap::IndexMap;

struct LfuEntry {
    value: Vec<f32>,
    freq: u64,
    last_tick: u64,
}

/// LFU-ordered segment; ties broken by least-recent use.
#[derive(Default)]
struct LfuSegment {
    entries: HashMap<i64, LfuEntry>,
    tick: u64,
}

impl LfuSegment {
    fn insert(&mut self, key: i64, value: Vec<f32>) {
        self.tick += 1;
        self.entries.insert(
            key,
            LfuEntry {
                value,
                freq: 1,
                last_tick: self.tick,
            },
        );
    }

    fn touch(&mut self, key: i64) -> Option<Vec<f32>> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(&key).map(|entry| {
            entry.freq += 1;
            entry.last_tick = tick;
            entry.value.clone()
        })
    }

    fn remove(&mut self, key: i64) -> Option<Vec<f32>> {
        self.entries.remove(&key).map(|entry| entry.value)
    }

    fn contains(&self, key: i64) -> bool {
        self.entries.contains_key(&key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn victim(&self) -> Option<i64> {
        self.entries
            .iter()
            .min_by_key(|(_, entry)| (entry.freq, entry.last_tick))
            .map(|(&key, _)| key)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.tick = 0;
    }
}

struct TinyLfuState {
    window_size: usize,
    probation_size: usize,
    protected_size: usize,
    window: IndexMap<i64, Vec<f32>>,
    probation: LfuSegment,
    protected: LfuSegment,
    cms: CountMinSketch,
    on_evict: Option<EvictionCallback>,
}

impl TinyLfuState {
    fn emit(&self, keys: &[i64]) {
        if let Some(on_evict) = &self.on_evict {
            on_evict(keys);
        }
    }

    fn contains(&self, key: i64) -> bool {
        self.window.contains_key(&key)
            || self.probation.contains(key)
            || self.protected.contains(key)
    }

    /// Admits a key into probation, evicting the segment's LFU victim when
    /// full. `from_active` marks keys that were live before this call, so a
    /// drop must be reported downstream.
    fn admit_to_probation(&mut self, key: i64, value: Vec<f32>, from_active: bool) {
        if self.probation_size == 0 {
            if from_active {
                self.emit(&[key]);
            }
            return;
        }
        if self.probation.len() >= self.probation_size
            && let Some(victim) = self.probation.victim()
        {
            self.probation.remove(victim);
            self.emit(&[victim]);
        }
        self.probation.insert(key, value);
    }

    fn put(&mut self, key: i64, value: Vec<f32>) {
        self.cms.add(key);

        if let Some(stored) = self.window.get_mut(&key) {
            *stored = value;
            return;
        }
        if let Some(entry) = self.probation.entries.get_mut(&key) {
            entry.value = value;
            return;
        }
        if let Some(entry) = self.protected.entries.get_mut(&key) {
            entry.value = value;
            return;
        }

        if self.window.len() < self.window_size {
            self.window.insert(key, value);
            return;
        }

        let Some((victim, victim_value)) = self.window.shift_remove_index(0) else {
            self.window.insert(key, value);
            return;
        };

        if self.cms.estimate(key) >= self.cms.estimate(victim) {
            self.emit(&[victim]);
            self.admit_to_probation(key, value, false);
        } else {
            self.admit_to_probation(victim, victim_value, true);
        }
    }

    fn get(&mut self, key: i64) -> Option<Vec<f32>> {
        if let Some(value) = self.window.shift_remove(&key) {
            self.window.insert(key, value);
            return self.window.get(&key).cloned();
        }
        if let Some(value) = self.protected.touch(key) {
            return Some(value);
        }
        if let Some(value) = self.probation.remove(key) {
            if self.protected.len() >= self.protected_size {
                if let Some(demoted) = self.protected.victim()
                    && let Some(demoted_value) = self.protected.remove(demoted)
                {
                    self.admit_to_probation(demoted, demoted_value, true);
                }
            }
            if self.protected_size > 0 {
                self.protected.insert(key, value.clone());
            } else {
                self.admit_to_probation(key, value.clone(), true);
            }
            return Some(value);
        }
        None
    }

    fn pop(&mut self, key: i64) -> Option<Vec<f32>> {
        if let Some(value) = self.window.shift_remove(&key) {
            return Some(value);
        }
        if let Some(value) = self.probation.remove(key) {
            return Some(value);
        }
        self.protected.remove(key)
    }
}

/// W-TinyLFU policy over `(id → embedding)` entries.
pub struct TinyLfuCache {
    inner: RwLock<TinyLfuState>,
}

impl TinyLfuCache {
    /// Creates an empty cache holding at most `maxsize` entries, with the
    /// default ~1% admission window.
    pub fn new(maxsize: usize) -> Self {
        Self::with_window_pct(maxsize, TINYLFU_WINDOW_PCT)
    }

    /// Creates a cache with an explicit window share.
    pub fn with_window_pct(maxsize: usize, window_pct: f64) -> Self {
        let window_size = ((maxsize as f64 * window_pct) as usize).max(1);
        let rest = maxsize.saturating_sub(window_size);
        let probation_size = rest / 2;
        let protected_size = rest - probation_size;

        Self {
            inner: RwLock::new(TinyLfuState {
                window_size,
                probation_size,
                protected_size,
                window: IndexMap::new(),
                probation: LfuSegment::default(),
                protected: LfuSegment::default(),
                cms: CountMinSketch::new(),
                on_evict: None,
            }),
        }
    }

    /// Subscribes the eviction event callback.
    pub fn subscribe(&self, on_evict: EvictionCallback) {
        self.inner.write().on_evict = Some(on_evict);
    }

    /// Inserts or refreshes an entry.
    pub fn put(&self, key: i64, value: Vec<f32>) {
        self.inner.write().put(key, value);
    }

    /// Looks up an entry, refreshing its recency/frequency standing.
    pub fn get(&self, key: i64) -> Option<Vec<f32>> {
        self.inner.write().get(key)
    }

    /// Removes an entry from whichever sub-cache holds it.
    pub fn pop(&self, key: i64) -> Option<Vec<f32>> {
        self.inner.write().pop(key)
    }

    /// `true` if any sub-cache holds `key`.
    pub fn contains(&self, key: i64) -> bool {
        self.inner.read().contains(key)
    }

    /// Total live entries across the three sub-caches.
    pub fn len(&self) -> usize {
        let state = self.inner.read();
        state.window.len() + state.probation.len() + state.protected.len()
    }

    /// `true` if no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.window.clear();
        state.probation.clear();
        state.protected.clear();
    }

    /// Frequency estimate from the admission sketch.
    pub fn estimate(&self, key: i64) -> u32 {
        self.inner.read().cms.estimate(key)
    }

    /// Current window occupancy.
    pub fn window_len(&self) -> usize {
        self.inner.read().window.len()
    }

    /// Current probation occupancy.
    pub fn probation_len(&self) -> usize {
        self.inner.read().probation.len()
    }

    /// Current protected occupancy.
    pub fn protected_len(&self) -> usize {
        self.inner.read().protected.len()
    }

    /// `true` if `key` sits in the protected segment.
    pub fn in_protected(&self, key: i64) -> bool {
        self.inner.read().protected.contains(key)
    }
}

impl std::fmt::Debug for TinyLfuCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("TinyLfuCache")
            .field("window", &state.window.len())
            .field("probation", &state.probation.len())
            .field("protected", &state.protected.len())
            .finish()
    }
}
