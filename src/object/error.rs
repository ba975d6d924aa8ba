use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by object store operations.
pub enum ObjectStoreError {
    /// The store root could not be prepared.
    #[error("failed to initialize object store at '{path}': {message}")]
    InitFailed {
        /// Store root.
        path: String,
        /// Error message.
        message: String,
    },

    /// Writing a blob failed.
    #[error("failed to store object: {message}")]
    PutFailed {
        /// Error message.
        message: String,
    },

    /// The handle does not name a stored blob.
    #[error("object not found: {handle}")]
    NotFound {
        /// Requested handle.
        handle: String,
    },

    /// Reading a blob failed.
    #[error("failed to load object '{handle}': {message}")]
    GetFailed {
        /// Requested handle.
        handle: String,
        /// Error message.
        message: String,
    },

    /// Deleting a blob failed.
    #[error("failed to delete object '{handle}': {message}")]
    DeleteFailed {
        /// Requested handle.
        handle: String,
        /// Error message.
        message: String,
    },
}
