//! Write-through coordinator for the scalar and vector tiers.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::ManagerError;
use crate::scalar::{CacheData, ScalarRecord, ScalarStore};
use crate::vector::{CreateStatus, SearchHit, VectorData, VectorStore, VectorStoreError};

/// Owns the durable tiers and orders their writes: scalar first (assigning
/// primary ids), then vector.
pub struct DatabaseCache {
    scalar: Arc<dyn ScalarStore>,
    vector: Arc<dyn VectorStore>,
}

impl DatabaseCache {
    /// Pairs the two durable tiers.
    pub fn new(scalar: Arc<dyn ScalarStore>, vector: Arc<dyn VectorStore>) -> Self {
        Self { scalar, vector }
    }

    /// The scalar tier.
    pub fn scalar(&self) -> &Arc<dyn ScalarStore> {
        &self.scalar
    }

    /// The vector tier.
    pub fn vector(&self) -> &Arc<dyn VectorStore> {
        &self.vector
    }

    /// Idempotently creates `model`'s vector collection.
    pub async fn create_vector(&self, model: &str) -> Result<CreateStatus, VectorStoreError> {
        self.vector.create(model).await
    }

    /// Writes records through both tiers, returning the scalar ids in input
    /// order. Rows without an embedding are not indexed.
    pub async fn batch_put(
        &self,
        records: Vec<CacheData>,
        model: &str,
    ) -> Result<Vec<i64>, ManagerError> {
        let embeddings: Vec<Option<Vec<f32>>> =
            records.iter().map(|r| r.embedding.clone()).collect();

        let ids = self.scalar.batch_insert(records, model).await?;

        let vector_data: Vec<VectorData> = ids
            .iter()
            .zip(embeddings)
            .filter_map(|(&id, embedding)| embedding.map(|data| VectorData::new(id, data)))
            .collect();

        if !vector_data.is_empty() {
            self.vector.mul_add(vector_data, model).await?;
        }

        debug!(count = ids.len(), model, "Batch write complete");
        Ok(ids)
    }

    /// Vector-tier similarity search.
    pub async fn search(
        &self,
        embedding: &[f32],
        top_k: i32,
        model: &str,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.vector.search(embedding, top_k, model).await
    }

    /// Fetches a live scalar record.
    pub async fn get_data_by_id(&self, id: i64) -> Result<Option<ScalarRecord>, ManagerError> {
        Ok(self.scalar.get_data_by_id(id).await?)
    }

    /// Bumps a record's hit counter.
    pub async fn update_hit_count_by_id(&self, id: i64) -> Result<(), ManagerError> {
        Ok(self.scalar.update_hit_count_by_id(id).await?)
    }

    /// Deletes ids from both tiers, each side independently error-caught.
    /// Returns `(scalar_count, vector_count)` with `-1` marking a failed
    /// side.
    pub async fn delete(&self, ids: &[i64], model: &str) -> (i64, i64) {
        let vector_count = match self.vector.delete(ids, model).await {
            Ok(count) => count as i64,
            Err(e) => {
                warn!(model, error = %e, "Vector delete failed");
                -1
            }
        };
        let scalar_count = match self.scalar.mark_deleted(ids).await {
            Ok(count) => count as i64,
            Err(e) => {
                warn!(model, error = %e, "Scalar tombstone failed");
                -1
            }
        };
        (scalar_count, vector_count)
    }

    /// Flushes both tiers.
    pub async fn flush(&self) -> Result<(), ManagerError> {
        self.scalar.flush().await?;
        self.vector.flush().await?;
        Ok(())
    }

    /// Closes both tiers.
    pub async fn close(&self) -> Result<(), ManagerError> {
        self.scalar.close().await?;
        self.vector.close().await?;
        Ok(())
    }
}

impl std::fmt::Debug for DatabaseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCache").finish_non_exhaustive()
    }
}
