use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by scalar store operations.
pub enum ScalarStoreError {
    /// Opening or migrating the backing database failed.
    #[error("failed to open scalar store at '{path}': {message}")]
    OpenFailed {
        /// Database location.
        path: String,
        /// Error message.
        message: String,
    },

    /// An insert failed.
    #[error("scalar insert failed: {message}")]
    InsertFailed {
        /// Error message.
        message: String,
    },

    /// A read failed.
    #[error("scalar read failed: {message}")]
    ReadFailed {
        /// Error message.
        message: String,
    },

    /// A delete or tombstone operation failed.
    #[error("scalar delete failed: {message}")]
    DeleteFailed {
        /// Error message.
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt scalar row {id}: {message}")]
    CorruptRow {
        /// Row id.
        id: i64,
        /// Error message.
        message: String,
    },

    /// The store was used after `close()`.
    #[error("scalar store is closed")]
    Closed,
}

impl From<rusqlite::Error> for ScalarStoreError {
    fn from(e: rusqlite::Error) -> Self {
        ScalarStoreError::ReadFailed {
            message: e.to_string(),
        }
    }
}
