//! Approximate nearest-neighbor tier, partitioned into per-model collections.

pub mod error;
pub mod flat;
pub mod model;


pub use error::VectorStoreError;
pub use flat::FlatVectorStore;
pub use model::{SearchHit, VectorData, embedding_bytes_to_f32, f32_to_embedding_bytes};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::CacheError;

/// Similarity metric of a vector store instance, fixed at construction.
///
/// Cosine stores report similarity (higher is better); L2 stores report
/// squared euclidean distance (lower is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Cosine similarity.
    Cosine,
    /// Squared euclidean distance.
    L2,
}

impl Metric {
    /// Parses the config form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "COSINE" => Some(Metric::Cosine),
            "L2" => Some(Metric::L2),
            _ => None,
        }
    }
}

/// Outcome of an idempotent collection creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    /// The collection did not exist and was created.
    Created,
    /// The collection already existed.
    AlreadyExists,
}

/// Per-model approximate nearest-neighbor index.
///
/// Dimension and metric are fixed at construction. Searching a model that was
/// never created returns an empty result rather than failing.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotently creates the collection for `model`.
    async fn create(&self, model: &str) -> Result<CreateStatus, VectorStoreError>;

    /// Adds (or replaces) a batch of vectors in `model`'s collection.
    async fn mul_add(
        &self,
        entries: Vec<VectorData>,
        model: &str,
    ) -> Result<(), VectorStoreError>;

    /// Searches `model`'s collection, best-first. `top_k <= 0` selects the
    /// policy default.
    async fn search(
        &self,
        query: &[f32],
        top_k: i32,
        model: &str,
    ) -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Deletes ids from `model`'s collection, returning how many were found.
    async fn delete(&self, ids: &[i64], model: &str) -> Result<usize, VectorStoreError>;

    /// Drops and recreates `model`'s collection.
    async fn rebuild_col(&self, model: &str) -> Result<(), VectorStoreError>;

    /// Flushes pending writes.
    async fn flush(&self) -> Result<(), VectorStoreError>;

    /// Releases backend resources. Idempotent.
    async fn close(&self) -> Result<(), VectorStoreError>;
}

/// Resolves a vector store implementation by name.
///
/// Network-backed drivers (`milvus`, `redis`, `chromadb`, ...) are provided
/// by external loaders; only the in-process `flat` index resolves in-tree.
pub fn open(name: &str, config: &Config) -> Result<Arc<dyn VectorStore>, CacheError> {
    match name {
        "flat" => Ok(Arc::new(FlatVectorStore::new(
            config.dimension,
            config.metric,
        ))),
        other => Err(CacheError::not_found("vector store", other)),
    }
}
