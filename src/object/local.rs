//! Filesystem-backed object store.
//!
//! One file per blob under a flat root directory; handles are v4 UUIDs, so
//! they carry no path components.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::ObjectStore;
use super::error::ObjectStoreError;

/// Blob store writing files under a local root directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Creates the store, preparing the root directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ObjectStoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| ObjectStoreError::InitFailed {
            path: root.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { root })
    }

    /// Store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, handle: &str) -> Result<PathBuf, ObjectStoreError> {
        // Handles are opaque to callers but must stay inside the root.
        if handle.contains('/') || handle.contains('\\') || handle.contains("..") {
            return Err(ObjectStoreError::NotFound {
                handle: handle.to_string(),
            });
        }
        Ok(self.root.join(handle))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, data: Vec<u8>) -> Result<String, ObjectStoreError> {
        let handle = Uuid::new_v4().to_string();
        let path = self.root.join(&handle);
        tokio::task::spawn_blocking(move || std::fs::write(path, data))
            .await
            .map_err(|e| ObjectStoreError::PutFailed {
                message: format!("blocking task failed: {e}"),
            })?
            .map_err(|e| ObjectStoreError::PutFailed {
                message: e.to_string(),
            })?;
        Ok(handle)
    }

    async fn get(&self, handle: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.blob_path(handle)?;
        let handle = handle.to_string();
        tokio::task::spawn_blocking(move || std::fs::read(path))
            .await
            .map_err(|e| ObjectStoreError::GetFailed {
                handle: handle.clone(),
                message: format!("blocking task failed: {e}"),
            })?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ObjectStoreError::NotFound { handle },
                _ => ObjectStoreError::GetFailed {
                    handle,
                    message: e.to_string(),
                },
            })
    }

    async fn delete(&self, handle: &str) -> Result<(), ObjectStoreError> {
        let path = self.blob_path(handle)?;
        let handle = handle.to_string();
        tokio::task::spawn_blocking(move || std::fs::remove_file(path))
            .await
            .map_err(|e| ObjectStoreError::DeleteFailed {
                handle: handle.clone(),
                message: format!("blocking task failed: {e}"),
            })?
            .or_else(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Ok(()),
                _ => Err(ObjectStoreError::DeleteFailed {
                    handle,
                    message: e.to_string(),
                }),
            })
    }
}
