//! Engine-wide defaults.

/// Default number of candidates fetched from the vector tier per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Default acceptance threshold for similarity scores.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.95;

/// Pre-processed query length (chars) beyond which the long-query threshold applies.
pub const LONG_QUERY_BOUNDARY: usize = 256;

/// Default per-model hot-set capacity.
pub const DEFAULT_MEMORY_MAXSIZE: usize = 100_000;

/// Default embedding worker count.
pub const DEFAULT_EMBEDDING_WORKERS: usize = 1;

/// Default audit log worker count.
pub const DEFAULT_AUDIT_WORKERS: usize = 6;

/// Depth of the embedding job queue.
pub const EMBEDDING_QUEUE_DEPTH: usize = 256;

/// Depth of the audit record queue.
pub const AUDIT_QUEUE_DEPTH: usize = 1024;

/// Default embedding dimension of the in-tree hash embedder.
pub const DEFAULT_DIMENSION: usize = 128;

/// Count-Min Sketch width.
pub const CMS_WIDTH: usize = 1024;

/// Count-Min Sketch depth.
pub const CMS_DEPTH: usize = 4;

/// Adds between Count-Min Sketch decay passes.
pub const CMS_DECAY_INTERVAL: u64 = 10_000;

/// Share of a W-TinyLFU cache devoted to the admission window.
pub const TINYLFU_WINDOW_PCT: f64 = 0.01;

/// Upper bound of a squared-euclidean distance between unit vectors.
pub const MAX_UNIT_SQUARED_L2: f32 = 4.0;
