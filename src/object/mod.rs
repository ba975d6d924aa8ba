//! Blob storage for non-string answers and fetched dep payloads.

pub mod error;
pub mod local;

#[cfg(test)]
mod tests;

pub use error::ObjectStoreError;
pub use local::LocalObjectStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::CacheError;

/// Content-opaque blob store keyed by opaque string handles.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores a blob and returns its handle.
    async fn put(&self, data: Vec<u8>) -> Result<String, ObjectStoreError>;

    /// Loads a blob by handle.
    async fn get(&self, handle: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Deletes a blob by handle.
    async fn delete(&self, handle: &str) -> Result<(), ObjectStoreError>;
}

/// Resolves an object store implementation by name.
///
/// Cloud stores (`s3`, `oss`, ...) are provided by external loaders; only
/// `local` resolves in-tree.
pub fn open(name: &str, config: &Config) -> Result<Arc<dyn ObjectStore>, CacheError> {
    match name {
        "local" => {
            let store = LocalObjectStore::new(&config.object_root)
                .map_err(|e| CacheError::Cache(e.to_string()))?;
            Ok(Arc::new(store))
        }
        other => Err(CacheError::not_found("object store", other)),
    }
}
