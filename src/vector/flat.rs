//! Brute-force in-process vector index.
//!
//! Linear scan over per-model collections. Plays the role of a local,
//! configuration-free backend; accuracy is exact, capacity is whatever fits
//! in memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::error::VectorStoreError;
use super::model::{SearchHit, VectorData};
use super::{CreateStatus, Metric, VectorStore};
use crate::constants::DEFAULT_TOP_K;

#[derive(Default)]
struct Collection {
    points: HashMap<i64, Vec<f32>>,
}

/// Exact-scan vector store over in-memory collections.
pub struct FlatVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
    dimension: usize,
    metric: Metric,
    closed: AtomicBool,
}

impl FlatVectorStore {
    /// Creates an empty store with a fixed dimension and metric.
    pub fn new(dimension: usize, metric: Metric) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            dimension,
            metric,
            closed: AtomicBool::new(false),
        }
    }

    /// Configured dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Configured metric.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of vectors currently indexed for `model`.
    pub fn point_count(&self, model: &str) -> Option<usize> {
        self.collections
            .read()
            .get(model)
            .map(|c| c.points.len())
    }

    fn ensure_open(&self) -> Result<(), VectorStoreError> {
        if self.closed.load(Ordering::Acquire) {
            Err(VectorStoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorStoreError> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::L2 => squared_l2(a, b),
        }
    }
}

impl std::fmt::Debug for FlatVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatVectorStore")
            .field("dimension", &self.dimension)
            .field("metric", &self.metric)
            .field("collections", &self.collections.read().len())
            .finish()
    }
}

#[async_trait]
impl VectorStore for FlatVectorStore {
    async fn create(&self, model: &str) -> Result<CreateStatus, VectorStoreError> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        if collections.contains_key(model) {
            return Ok(CreateStatus::AlreadyExists);
        }
        collections.insert(model.to_string(), Collection::default());
        debug!(model, "Created vector collection");
        Ok(CreateStatus::Created)
    }

    async fn mul_add(
        &self,
        entries: Vec<VectorData>,
        model: &str,
    ) -> Result<(), VectorStoreError> {
        self.ensure_open()?;
        for entry in &entries {
            self.check_dimension(&entry.data)?;
        }

        let mut collections = self.collections.write();
        let collection = collections.entry(model.to_string()).or_default();
        for entry in entries {
            collection.points.insert(entry.id, entry.data);
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: i32,
        model: &str,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.ensure_open()?;
        self.check_dimension(query)?;

        let limit = if top_k <= 0 {
            DEFAULT_TOP_K
        } else {
            top_k as usize
        };

        let collections = self.collections.read();
        // An unregistered model is a miss, not an error.
        let Some(collection) = collections.get(model) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = collection
            .points
            .iter()
            .map(|(&id, vector)| SearchHit {
                distance: self.distance(query, vector),
                id,
            })
            .collect();

        match self.metric {
            Metric::Cosine => hits.sort_by(|a, b| {
                b.distance
                    .partial_cmp(&a.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            Metric::L2 => hits.sort_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }

        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete(&self, ids: &[i64], model: &str) -> Result<usize, VectorStoreError> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        let Some(collection) = collections.get_mut(model) else {
            return Ok(0);
        };
        let mut removed = 0;
        for id in ids {
            if collection.points.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn rebuild_col(&self, model: &str) -> Result<(), VectorStoreError> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        collections.insert(model.to_string(), Collection::default());
        debug!(model, "Rebuilt vector collection");
        Ok(())
    }

    async fn flush(&self) -> Result<(), VectorStoreError> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<(), VectorStoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Cosine similarity of two equal-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
