use thiserror::Error;

use crate::object::ObjectStoreError;
use crate::scalar::ScalarStoreError;
use crate::vector::VectorStoreError;

#[derive(Debug, Error)]
/// Errors surfaced by the data manager facade.
pub enum ManagerError {
    /// Mismatched or invalid save parameters.
    #[error("invalid parameter: {0}")]
    Param(String),

    /// A non-string payload needs an object store, but none is configured.
    #[error("no object store configured for non-string payloads")]
    ObjectStoreMissing,

    /// Fetching an IMAGE_URL dep failed.
    #[error("failed to fetch dep '{url}': {message}")]
    DepFetchFailed {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Scalar tier failure.
    #[error(transparent)]
    Scalar(#[from] ScalarStoreError),

    /// Vector tier failure.
    #[error(transparent)]
    Vector(#[from] VectorStoreError),

    /// Object tier failure.
    #[error(transparent)]
    Object(#[from] ObjectStoreError),
}
