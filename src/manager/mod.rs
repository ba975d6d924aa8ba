//! Data manager facade over the memory, scalar, vector and object tiers.

pub mod database;
pub mod error;


pub use database::DatabaseCache;
pub use error::ManagerError;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, error, instrument, warn};

use crate::eviction::{EvictionListener, MemoryCache, PolicyKind};
use crate::object::ObjectStore;
use crate::scalar::{Answer, AnswerType, CacheData, DepType, Question, ScalarRecord};
use crate::vector::{CreateStatus, SearchHit};

/// Per-tier outcome of a remove or truncate, shaped for the response body.
#[derive(Debug, Clone, Serialize)]
pub struct RemovalStatus {
    /// `success` or `failed`.
    pub status: String,
    /// Vector-tier outcome message.
    #[serde(rename = "VectorDB")]
    pub vector_db: String,
    /// Scalar-tier outcome message.
    #[serde(rename = "ScalarDB")]
    pub scalar_db: String,
}

impl RemovalStatus {
    fn success(vector_db: String, scalar_db: String) -> Self {
        Self {
            status: "success".to_string(),
            vector_db,
            scalar_db,
        }
    }

    fn failed(vector_db: String, scalar_db: String) -> Self {
        Self {
            status: "failed".to_string(),
            vector_db,
            scalar_db,
        }
    }

    /// `true` if both tiers succeeded.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// L2-unit normalization. Zero vectors pass through unchanged.
pub fn normalize(embedding: &[f32]) -> Vec<f32> {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 {
        return embedding.to_vec();
    }
    embedding.iter().map(|x| x / magnitude).collect()
}

/// Facade combining the hot set, the durable tiers and the object store.
///
/// Owns normalization policy: when enabled, embeddings are unit-normalized
/// symmetrically on save and on search, so the bytes in the hot set and the
/// vector index always agree.
pub struct DataManager {
    normalize: bool,
    object: Option<Arc<dyn ObjectStore>>,
    memory: MemoryCache,
    database: DatabaseCache,
    http: reqwest::Client,
    closed: AtomicBool,
}

impl DataManager {
    /// Assembles the facade and subscribes the advisory eviction listener.
    pub fn new(
        database: DatabaseCache,
        object: Option<Arc<dyn ObjectStore>>,
        policy: PolicyKind,
        memory_maxsize: usize,
        normalize: bool,
    ) -> Self {
        let mut memory = MemoryCache::new(policy, memory_maxsize);
        // Memory eviction is advisory: the hot set already dropped the key,
        // and the durable tiers stay authoritative (tombstones happen only on
        // explicit delete/truncate).
        let listener: EvictionListener = Arc::new(|model: &str, ids: &[i64]| {
            debug!(model, ?ids, "Hot-set eviction");
        });
        memory.subscribe(listener);

        Self {
            normalize,
            object,
            memory,
            database,
            http: reqwest::Client::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether embeddings are unit-normalized.
    pub fn normalizes(&self) -> bool {
        self.normalize
    }

    /// The durable-tier coordinator.
    pub fn database(&self) -> &DatabaseCache {
        &self.database
    }

    /// The hot set.
    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    /// Idempotently creates `model`'s vector collection.
    pub async fn create_vector(&self, model: &str) -> Result<CreateStatus, ManagerError> {
        Ok(self.database.create_vector(model).await?)
    }

    /// Persists a batch of (question, answer, embedding) triples under
    /// `model`, resolving blob payloads first, and records the new ids in
    /// the hot set. Returns the scalar ids in input order.
    #[instrument(skip_all, fields(model, count = questions.len()))]
    pub async fn save(
        &self,
        questions: Vec<Question>,
        answers: Vec<Answer>,
        embeddings: Vec<Vec<f32>>,
        model: &str,
    ) -> Result<Vec<i64>, ManagerError> {
        if questions.len() != answers.len() || questions.len() != embeddings.len() {
            return Err(ManagerError::Param(
                "questions, answers and embeddings must have the same length".to_string(),
            ));
        }
        if questions.is_empty() {
            return Err(ManagerError::Param("nothing to save".to_string()));
        }

        let mut records = Vec::with_capacity(questions.len());
        let mut stored_embeddings = Vec::with_capacity(embeddings.len());

        for ((question, answer), embedding) in questions.into_iter().zip(answers).zip(embeddings) {
            let question = self.resolve_question(question).await?;
            let answer = self.resolve_answer(answer).await?;

            let embedding = if self.normalize {
                normalize(&embedding)
            } else {
                embedding
            };

            stored_embeddings.push(embedding.clone());
            records.push(CacheData::new(question, answer, embedding));
        }

        let ids = self.database.batch_put(records, model).await?;

        let pairs: Vec<(i64, Vec<f32>)> =
            ids.iter().copied().zip(stored_embeddings).collect();
        self.memory.batch_put(pairs, model);

        Ok(ids)
    }

    /// Offloads non-string answers to the object store, replacing the value
    /// with the handle.
    async fn resolve_answer(&self, answer: Answer) -> Result<Answer, ManagerError> {
        if answer.answer_type == AnswerType::Str {
            return Ok(answer);
        }
        let object = self.object.as_ref().ok_or(ManagerError::ObjectStoreMissing)?;
        let handle = object.put(answer.value.into_bytes()).await?;
        Ok(Answer {
            value: handle,
            answer_type: answer.answer_type,
        })
    }

    /// Fetches IMAGE_URL deps and rewrites their data to object handles.
    async fn resolve_question(&self, mut question: Question) -> Result<Question, ManagerError> {
        let Some(deps) = question.deps.as_mut() else {
            return Ok(question);
        };

        for dep in deps.iter_mut() {
            if dep.dep_type != DepType::ImageUrl {
                continue;
            }
            let object = self.object.as_ref().ok_or(ManagerError::ObjectStoreMissing)?;

            let response = self.http.get(&dep.data).send().await.map_err(|e| {
                ManagerError::DepFetchFailed {
                    url: dep.data.clone(),
                    message: e.to_string(),
                }
            })?;
            let payload = response
                .bytes()
                .await
                .map_err(|e| ManagerError::DepFetchFailed {
                    url: dep.data.clone(),
                    message: e.to_string(),
                })?;

            dep.data = object.put(payload.to_vec()).await?;
        }
        Ok(question)
    }

    /// Similarity search under `model`, normalizing the probe if configured.
    pub async fn search(
        &self,
        embedding: &[f32],
        model: &str,
        top_k: i32,
    ) -> Result<Vec<SearchHit>, ManagerError> {
        let probe;
        let query = if self.normalize {
            probe = normalize(embedding);
            probe.as_slice()
        } else {
            embedding
        };
        Ok(self.database.search(query, top_k, model).await?)
    }

    /// Resolves one search candidate to its scalar record.
    ///
    /// A hot-set hit refreshes the entry's standing; the textual record
    /// itself always comes from the scalar tier (the hot set only holds
    /// embeddings).
    pub async fn get_scalar_data(
        &self,
        candidate: &SearchHit,
        model: &str,
    ) -> Result<Option<ScalarRecord>, ManagerError> {
        if self.memory.get(candidate.id, model).is_some() {
            debug!(id = candidate.id, model, "Hot-set hit");
        }
        self.database.get_data_by_id(candidate.id).await
    }

    /// Bumps a record's hit counter.
    pub async fn update_hit_count(&self, id: i64) -> Result<(), ManagerError> {
        self.database.update_hit_count_by_id(id).await
    }

    /// Removes entries from every tier: hot set pop, vector delete, scalar
    /// tombstone. A vector failure short-circuits the scalar attempt.
    #[instrument(skip_all, fields(model, count = ids.len()))]
    pub async fn delete(&self, ids: &[i64], model: &str) -> RemovalStatus {
        for &id in ids {
            self.memory.pop(id, model);
        }

        let vector_count = match self.database.vector().delete(ids, model).await {
            Ok(count) => count,
            Err(e) => {
                return RemovalStatus::failed(
                    format!("delete vector data failed, please check! e: {e}"),
                    "unexecuted".to_string(),
                );
            }
        };

        match self.database.scalar().mark_deleted(ids).await {
            Ok(scalar_count) => RemovalStatus::success(
                format!("delete_count: {vector_count}"),
                format!("delete_count: {scalar_count}"),
            ),
            Err(e) => RemovalStatus::failed(
                "success".to_string(),
                format!("delete scalar data failed, please check! e: {e}"),
            ),
        }
    }

    /// Resets a model scope: hot set cleared, vector collection rebuilt,
    /// scalar rows deleted by model.
    #[instrument(skip_all, fields(model))]
    pub async fn truncate(&self, model: &str) -> RemovalStatus {
        self.memory.clear(model);

        if let Err(e) = self.database.vector().rebuild_col(model).await {
            return RemovalStatus::failed(
                format!("truncate vector data failed, please check! e: {e}"),
                "unexecuted".to_string(),
            );
        }

        match self.database.scalar().model_deleted(model).await {
            Ok(count) => {
                RemovalStatus::success("rebuild".to_string(), format!("delete_count: {count}"))
            }
            Err(e) => RemovalStatus::failed(
                "rebuild".to_string(),
                format!("truncate scalar data failed, please check! e: {e}"),
            ),
        }
    }

    /// Flushes the durable tiers.
    pub async fn flush(&self) -> Result<(), ManagerError> {
        self.database.flush().await
    }

    /// Flushes and closes every tier. Idempotent; failures are logged, not
    /// raised.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.database.flush().await {
            warn!(error = %e, "Flush on close failed");
        }
        if let Err(e) = self.database.close().await {
            error!(error = %e, "Close failed");
        }
    }
}

impl std::fmt::Debug for DataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataManager")
            .field("normalize", &self.normalize)
            .field("memory", &self.memory)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
