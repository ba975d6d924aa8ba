//! Count-Min Sketch frequency estimator.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::Rng;

use crate::constants::{CMS_DECAY_INTERVAL, CMS_DEPTH, CMS_WIDTH};

/// Probabilistic frequency counter with conservative update and periodic
/// decay (all counters halved every `decay_interval` adds).
pub struct CountMinSketch {
    width: usize,
    tables: Vec<Vec<u32>>,
    seeds: Vec<u64>,
    ops: u64,
    decay_interval: u64,
}

impl CountMinSketch {
    /// Creates a sketch with the default geometry (1024 × 4).
    pub fn new() -> Self {
        Self::with_geometry(CMS_WIDTH, CMS_DEPTH, CMS_DECAY_INTERVAL)
    }

    /// Creates a sketch with explicit width, depth and decay interval.
    pub fn with_geometry(width: usize, depth: usize, decay_interval: u64) -> Self {
        let mut rng = rand::rng();
        let seeds = (0..depth).map(|_| rng.random::<u64>()).collect();
        Self {
            width,
            tables: vec![vec![0; width]; depth],
            seeds,
            ops: 0,
            decay_interval,
        }
    }

    fn index(&self, key: i64, seed: u64) -> usize {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.width as u64) as usize
    }

    /// Records one occurrence of `key`.
    ///
    /// Conservative update: only rows currently at the minimum estimate are
    /// incremented.
    pub fn add(&mut self, key: i64) {
        self.ops += 1;
        let estimate = self.estimate(key);
        for (row, &seed) in self.seeds.iter().enumerate() {
            let idx = self.index(key, seed);
            if self.tables[row][idx] <= estimate {
                self.tables[row][idx] += 1;
            }
        }
        if self.ops >= self.decay_interval {
            self.decay();
            self.ops = 0;
        }
    }

    /// Estimated occurrence count of `key`.
    pub fn estimate(&self, key: i64) -> u32 {
        self.seeds
            .iter()
            .enumerate()
            .map(|(row, &seed)| self.tables[row][self.index(key, seed)])
            .min()
            .unwrap_or(0)
    }

    /// Halves every counter.
    pub fn decay(&mut self) {
        for table in &mut self.tables {
            for counter in table.iter_mut() {
                *counter >>= 1;
            }
        }
    }
}

impl Default for CountMinSketch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CountMinSketch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountMinSketch")
            .field("width", &self.width)
            .field("depth", &self.seeds.len())
            .field("ops", &self.ops)
            .finish()
    }
}
