//! Admission and eviction policies for the per-model hot set.
//!
//! Two policies are available: [`ArcCache`] (adaptive replacement) and
//! [`TinyLfuCache`] (windowed TinyLFU with a Count-Min Sketch frequency
//! estimator). [`MemoryCache`] maps each model scope to its own policy
//! instance and forwards eviction events to a single subscriber.

pub mod arc;
pub mod memory;
pub mod sketch;
pub mod tinylfu;

#[cfg(test)]
mod memory_tests;
#[cfg(test)]
mod tinylfu_tests;

pub use arc::ArcCache;
pub use memory::{EvictionListener, MemoryCache};
pub use sketch::CountMinSketch;
pub use tinylfu::TinyLfuCache;

/// Callback fired by a policy when keys leave its active set.
///
/// Runs synchronously while the policy is mid-mutation; the subscriber must
/// not call back into the same policy instance.
pub type EvictionCallback = Box<dyn Fn(&[i64]) + Send + Sync>;

/// Which policy backs the hot set of each model scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Adaptive Replacement Cache.
    Arc,
    /// Windowed TinyLFU.
    WTinyLfu,
}

impl PolicyKind {
    /// Parses the config form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ARC" => Some(PolicyKind::Arc),
            "WTINYLFU" | "W_TINYLFU" | "W-TINYLFU" => Some(PolicyKind::WTinyLfu),
            _ => None,
        }
    }
}
