use thiserror::Error;

#[derive(Debug, Error)]
/// Configuration validation and parse failures.
pub enum ConfigError {
    /// A numeric env var did not parse.
    #[error("invalid value for {var}: '{value}'")]
    InvalidNumber {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
    },

    /// A similarity threshold was outside `[0, 1]`.
    #[error("invalid similarity threshold {value}, reasonable range: 0-1")]
    InvalidThreshold {
        /// Offending value.
        value: f32,
    },

    /// An unknown metric name.
    #[error("unknown similarity metric: '{value}'")]
    InvalidMetric {
        /// Offending value.
        value: String,
    },

    /// An unknown eviction policy name.
    #[error("unknown eviction policy: '{value}'")]
    InvalidPolicy {
        /// Offending value.
        value: String,
    },

    /// The embedding dimension must be non-zero.
    #[error("embedding dimension must be non-zero")]
    ZeroDimension,

    /// A worker pool needs at least one worker.
    #[error("{pool} worker count must be non-zero")]
    ZeroWorkers {
        /// Pool name.
        pool: String,
    },
}
