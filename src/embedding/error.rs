use thiserror::Error;

#[derive(Debug, Error)]
/// Errors surfaced by the embedding pipeline.
pub enum EmbeddingError {
    /// The embedder produced (or was configured with) the wrong dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Inference failed inside a worker.
    #[error("embedding inference failed: {reason}")]
    InferenceFailed {
        /// Failure description.
        reason: String,
    },

    /// The dispatcher's job queue is gone (pool shut down).
    #[error("embedding dispatcher is closed")]
    DispatcherClosed,

    /// The worker dropped the reply channel without answering.
    #[error("embedding worker dropped the request")]
    WorkerGone,

    /// Invalid pool configuration.
    #[error("invalid embedding config: {reason}")]
    InvalidConfig {
        /// Failure description.
        reason: String,
    },
}
