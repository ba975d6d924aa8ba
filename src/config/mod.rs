//! Environment-backed engine configuration.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_AUDIT_WORKERS, DEFAULT_DIMENSION, DEFAULT_EMBEDDING_WORKERS, DEFAULT_MEMORY_MAXSIZE,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K, MAX_UNIT_SQUARED_L2,
};
use crate::eviction::PolicyKind;
use crate::vector::Metric;

/// Engine configuration.
///
/// Backend connection details (MySQL hosts, Milvus endpoints, ...) belong to
/// the external store loaders; only engine knobs live here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Scalar store backend name (`sqlite`).
    pub scalar_store: String,
    /// Vector store backend name (`flat`).
    pub vector_store: String,
    /// Object store backend name (`local`), if blobs are needed.
    pub object_store: Option<String>,
    /// SQLite database path.
    pub sqlite_path: String,
    /// Root directory of the local object store.
    pub object_root: PathBuf,
    /// Embedding dimension, fixed per deployment.
    pub dimension: usize,
    /// Vector similarity metric.
    pub metric: Metric,
    /// Whether embeddings are L2-unit normalized on write and query.
    pub normalize: bool,
    /// Acceptance threshold for similarity scores.
    pub similarity_threshold: f32,
    /// Threshold replacing the standard one for long queries.
    pub similarity_threshold_long: f32,
    /// Distance bound for non-normalized L2 score conversion.
    pub max_distance: f32,
    /// Candidates fetched from the vector tier per query.
    pub top_k: usize,
    /// Hot-set admission policy.
    pub memory_policy: PolicyKind,
    /// Per-model hot-set capacity.
    pub memory_maxsize: usize,
    /// Embedding model name (`hash`).
    pub embedding_model: String,
    /// Embedding worker count.
    pub embedding_workers: usize,
    /// Audit log worker count.
    pub audit_workers: usize,
    /// Normalized model names refused by query/insert.
    pub model_blacklist: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scalar_store: "sqlite".to_string(),
            vector_store: "flat".to_string(),
            object_store: None,
            sqlite_path: "./semcache.db".to_string(),
            object_root: PathBuf::from("./.objects"),
            dimension: DEFAULT_DIMENSION,
            metric: Metric::Cosine,
            normalize: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            similarity_threshold_long: DEFAULT_SIMILARITY_THRESHOLD,
            max_distance: MAX_UNIT_SQUARED_L2,
            top_k: DEFAULT_TOP_K,
            memory_policy: PolicyKind::WTinyLfu,
            memory_maxsize: DEFAULT_MEMORY_MAXSIZE,
            embedding_model: "hash".to_string(),
            embedding_workers: DEFAULT_EMBEDDING_WORKERS,
            audit_workers: DEFAULT_AUDIT_WORKERS,
            model_blacklist: Vec::new(),
        }
    }
}

impl Config {
    const ENV_SCALAR_STORE: &'static str = "SEMCACHE_SCALAR_STORE";
    const ENV_VECTOR_STORE: &'static str = "SEMCACHE_VECTOR_STORE";
    const ENV_OBJECT_STORE: &'static str = "SEMCACHE_OBJECT_STORE";
    const ENV_SQLITE_PATH: &'static str = "SEMCACHE_SQLITE_PATH";
    const ENV_OBJECT_ROOT: &'static str = "SEMCACHE_OBJECT_ROOT";
    const ENV_DIMENSION: &'static str = "SEMCACHE_DIMENSION";
    const ENV_METRIC: &'static str = "SEMCACHE_METRIC";
    const ENV_NORMALIZE: &'static str = "SEMCACHE_NORMALIZE";
    const ENV_THRESHOLD: &'static str = "SEMCACHE_SIMILARITY_THRESHOLD";
    const ENV_THRESHOLD_LONG: &'static str = "SEMCACHE_SIMILARITY_THRESHOLD_LONG";
    const ENV_TOP_K: &'static str = "SEMCACHE_TOP_K";
    const ENV_MEMORY_POLICY: &'static str = "SEMCACHE_MEMORY_POLICY";
    const ENV_MEMORY_MAXSIZE: &'static str = "SEMCACHE_MEMORY_MAXSIZE";
    const ENV_EMBEDDING_MODEL: &'static str = "SEMCACHE_EMBEDDING_MODEL";
    const ENV_EMBEDDING_WORKERS: &'static str = "SEMCACHE_EMBEDDING_WORKERS";
    const ENV_AUDIT_WORKERS: &'static str = "SEMCACHE_AUDIT_WORKERS";
    const ENV_MODEL_BLACKLIST: &'static str = "SEMCACHE_MODEL_BLACKLIST";

    /// Builds a config from `SEMCACHE_*` env vars over the defaults, then
    /// validates it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let metric = match env::var(Self::ENV_METRIC) {
            Ok(value) => Metric::parse(&value).ok_or(ConfigError::InvalidMetric { value })?,
            Err(_) => defaults.metric,
        };
        let memory_policy = match env::var(Self::ENV_MEMORY_POLICY) {
            Ok(value) => PolicyKind::parse(&value).ok_or(ConfigError::InvalidPolicy { value })?,
            Err(_) => defaults.memory_policy,
        };

        let config = Self {
            scalar_store: string_from_env(Self::ENV_SCALAR_STORE, defaults.scalar_store),
            vector_store: string_from_env(Self::ENV_VECTOR_STORE, defaults.vector_store),
            object_store: optional_from_env(Self::ENV_OBJECT_STORE),
            sqlite_path: string_from_env(Self::ENV_SQLITE_PATH, defaults.sqlite_path),
            object_root: env::var(Self::ENV_OBJECT_ROOT)
                .map(PathBuf::from)
                .unwrap_or(defaults.object_root),
            dimension: number_from_env(Self::ENV_DIMENSION, defaults.dimension)?,
            metric,
            normalize: bool_from_env(Self::ENV_NORMALIZE, defaults.normalize),
            similarity_threshold: float_from_env(
                Self::ENV_THRESHOLD,
                defaults.similarity_threshold,
            )?,
            similarity_threshold_long: float_from_env(
                Self::ENV_THRESHOLD_LONG,
                defaults.similarity_threshold_long,
            )?,
            max_distance: defaults.max_distance,
            top_k: number_from_env(Self::ENV_TOP_K, defaults.top_k)?,
            memory_policy,
            memory_maxsize: number_from_env(Self::ENV_MEMORY_MAXSIZE, defaults.memory_maxsize)?,
            embedding_model: string_from_env(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model),
            embedding_workers: number_from_env(
                Self::ENV_EMBEDDING_WORKERS,
                defaults.embedding_workers,
            )?,
            audit_workers: number_from_env(Self::ENV_AUDIT_WORKERS, defaults.audit_workers)?,
            model_blacklist: list_from_env(Self::ENV_MODEL_BLACKLIST),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for threshold in [self.similarity_threshold, self.similarity_threshold_long] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::InvalidThreshold { value: threshold });
            }
        }
        if self.dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.embedding_workers == 0 {
            return Err(ConfigError::ZeroWorkers {
                pool: "embedding".to_string(),
            });
        }
        if self.audit_workers == 0 {
            return Err(ConfigError::ZeroWorkers {
                pool: "audit".to_string(),
            });
        }
        Ok(())
    }
}

fn string_from_env(var: &str, default: String) -> String {
    env::var(var).unwrap_or(default)
}

fn optional_from_env(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bool_from_env(var: &str, default: bool) -> bool {
    env::var(var)
        .ok()
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn number_from_env<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn float_from_env(var: &str, default: f32) -> Result<f32, ConfigError> {
    number_from_env(var, default)
}

fn list_from_env(var: &str) -> Vec<String> {
    env::var(var)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
