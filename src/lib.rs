//! # Semcache
//!
//! Two-tier semantic response cache for LLM serving.
//!
//! Semcache sits between a front-end and an LLM provider and answers a query
//! from previously stored (question, answer) pairs whenever a sufficiently
//! similar question has been seen under the same model scope.
//!
//! ```text
//! Request → pre-process → embed → vector search → scalar fetch → threshold → answer
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use semcache::{Config, RequestHandler};
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let handler = RequestHandler::from_config(Config::from_env()?).await?;
//! let resp = handler
//!     .handle(json!({
//!         "type": "query",
//!         "scope": {"model": "gpt-4.1"},
//!         "query": "hello there",
//!     }))
//!     .await;
//! println!("{resp}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`handler`] - Request parsing and dispatch (query / insert / remove / register)
//! - [`manager`] - DataManager facade over the memory / scalar / vector tiers
//! - [`eviction`] - ARC and W-TinyLFU admission policies plus the per-model hot set
//! - [`embedding`] - Embedding worker pool
//! - [`scalar`] - Durable question/answer records (SQLite backend)
//! - [`vector`] - Approximate nearest-neighbor tier (in-process flat backend)
//! - [`object`] - Blob storage for non-string answers
//! - [`similarity`] - Distance-to-score conversion and thresholding
//! - [`audit`] - Fire-and-forget query log sink

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod audit;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod error;
pub mod eviction;
pub mod handler;
pub mod manager;
pub mod object;
pub mod processor;
pub mod scalar;
pub mod similarity;
pub mod vector;

pub use audit::QueryLogSink;
pub use config::{Config, ConfigError};
pub use embedding::{
    EmbeddingDispatcher, EmbeddingError, HashEmbedder, TextEmbedder, embedder_from_config,
};
pub use error::CacheError;
pub use eviction::{ArcCache, EvictionCallback, MemoryCache, PolicyKind, TinyLfuCache};
pub use handler::{RequestHandler, normalize_model_scope};
pub use manager::{DataManager, DatabaseCache, ManagerError, RemovalStatus};
pub use object::{LocalObjectStore, ObjectStore, ObjectStoreError};
pub use scalar::{
    Answer, AnswerType, CacheData, Dep, DepType, Question, QueryLogRecord, ScalarRecord,
    ScalarStore, ScalarStoreError, SqliteScalarStore,
};
pub use similarity::SimilarityEvaluator;
pub use vector::{
    CreateStatus, FlatVectorStore, Metric, SearchHit, VectorData, VectorStore, VectorStoreError,
    embedding_bytes_to_f32, f32_to_embedding_bytes,
};
