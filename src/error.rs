//! Crate-level error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
/// Top-level cache failures surfaced by the facade and the store registries.
pub enum CacheError {
    /// A component was used before it was initialized.
    #[error("the cache should be initialized before use")]
    NotInit,

    /// An unknown store or model name was requested.
    #[error("unsupported {kind}: {name}")]
    NotFound {
        /// What was being looked up (store kind, model, ...).
        kind: String,
        /// The unresolved name.
        name: String,
    },

    /// An invalid parameter was supplied.
    #[error("invalid parameter: {0}")]
    Param(String),

    /// A removal operation failed.
    #[error("cache remove error: {0}")]
    Remove(String),

    /// Generic core failure.
    #[error("{0}")]
    Cache(String),
}

impl CacheError {
    /// Convenience constructor for [`CacheError::NotFound`].
    pub fn not_found(kind: &str, name: &str) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}
