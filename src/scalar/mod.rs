//! Durable (question, answer, embedding) records partitioned by model scope.

pub mod error;
pub mod model;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use error::ScalarStoreError;
pub use model::{
    Answer, AnswerType, CacheData, Dep, DepType, Question, QueryLogRecord, ScalarRecord,
};
pub use sqlite::SqliteScalarStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::CacheError;

/// Durable record store for cache entries and the audit log.
///
/// Implementations must be safe under concurrent callers. `batch_insert` is
/// not required to be transactional but MUST return assigned ids in input
/// order.
#[async_trait]
pub trait ScalarStore: Send + Sync {
    /// Inserts a batch of records under `model`, returning ids in input order.
    async fn batch_insert(
        &self,
        records: Vec<CacheData>,
        model: &str,
    ) -> Result<Vec<i64>, ScalarStoreError>;

    /// Appends one audit record.
    async fn insert_query_resp(&self, record: QueryLogRecord) -> Result<(), ScalarStoreError>;

    /// Fetches a non-tombstoned record by id.
    async fn get_data_by_id(&self, id: i64) -> Result<Option<ScalarRecord>, ScalarStoreError>;

    /// Increments the hit counter of a record.
    async fn update_hit_count_by_id(&self, id: i64) -> Result<(), ScalarStoreError>;

    /// Tombstones the given ids, returning how many rows changed.
    async fn mark_deleted(&self, ids: &[i64]) -> Result<usize, ScalarStoreError>;

    /// Hard-deletes every row of a model scope, returning the count.
    async fn model_deleted(&self, model: &str) -> Result<usize, ScalarStoreError>;

    /// Purges tombstoned rows, returning the count.
    async fn clear_deleted_data(&self) -> Result<usize, ScalarStoreError>;

    /// Lists row ids, optionally including tombstoned rows.
    async fn get_ids(&self, include_deleted: bool) -> Result<Vec<i64>, ScalarStoreError>;

    /// Counts live rows.
    async fn count(&self) -> Result<usize, ScalarStoreError>;

    /// Flushes pending writes.
    async fn flush(&self) -> Result<(), ScalarStoreError>;

    /// Releases the underlying connection. Idempotent.
    async fn close(&self) -> Result<(), ScalarStoreError>;
}

/// Resolves a scalar store implementation by name.
///
/// Network-backed drivers (`mysql`, `elasticsearch`, ...) are provided by
/// external loaders; only `sqlite` resolves in-tree.
pub fn open(name: &str, config: &Config) -> Result<Arc<dyn ScalarStore>, CacheError> {
    match name {
        "sqlite" => {
            let store = SqliteScalarStore::open(&config.sqlite_path)
                .map_err(|e| CacheError::Cache(e.to_string()))?;
            Ok(Arc::new(store))
        }
        other => Err(CacheError::not_found("scalar store", other)),
    }
}
