//! Request parsing and dispatch.
//!
//! [`RequestHandler::handle`] is the single entry point: it parses the JSON
//! request, consults the model blacklist, dispatches to the
//! query/insert/remove/register pipelines and finally submits an audit
//! record for every request, whatever its outcome.

pub mod response;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::audit::QueryLogSink;
use crate::config::Config;
use crate::embedding::{EmbeddingDispatcher, embedder_from_config};
use crate::error::CacheError;
use crate::manager::{DataManager, DatabaseCache};
use crate::object;
use crate::processor::{self, InsertPreProcess, PostProcess, QueryPreProcess};
use crate::scalar::{self, Answer, Question, QueryLogRecord};
use crate::similarity::SimilarityEvaluator;
use crate::vector::{self, CreateStatus};

use response::*;

const REQUEST_TYPES: [&str; 4] = ["query", "insert", "remove", "register"];

/// Normalizes a model scope name: `-` and `.` become `_`.
pub fn normalize_model_scope(model: &str) -> String {
    model.replace(['-', '.'], "_")
}

/// Formats elapsed seconds the way responses carry them: rounded to two
/// decimals, `s`-suffixed.
fn format_delta(seconds: f64) -> String {
    format!("{}s", (seconds * 100.0).round() / 100.0)
}

/// Public facade of the cache engine: JSON request in, JSON response out.
pub struct RequestHandler {
    data_manager: Arc<DataManager>,
    dispatcher: EmbeddingDispatcher,
    evaluator: SimilarityEvaluator,
    query_pre: QueryPreProcess,
    insert_pre: InsertPreProcess,
    post_process: PostProcess,
    audit: QueryLogSink,
    blacklist: HashSet<String>,
    top_k: i32,
}

impl RequestHandler {
    /// Assembles a handler from its components with the default processors.
    pub fn new(
        data_manager: Arc<DataManager>,
        dispatcher: EmbeddingDispatcher,
        evaluator: SimilarityEvaluator,
        audit: QueryLogSink,
        blacklist: Vec<String>,
        top_k: usize,
    ) -> Self {
        let (query_pre, insert_pre, post_process) = processor::defaults();
        Self {
            data_manager,
            dispatcher,
            evaluator,
            query_pre,
            insert_pre,
            post_process,
            audit,
            blacklist: blacklist.into_iter().collect(),
            top_k: top_k as i32,
        }
    }

    /// Builds the whole engine from a [`Config`]: stores via the registries,
    /// the embedding pool, the evaluator and the audit sink.
    pub async fn from_config(config: Config) -> Result<Self, CacheError> {
        config
            .validate()
            .map_err(|e| CacheError::Param(e.to_string()))?;

        let scalar = scalar::open(&config.scalar_store, &config)?;
        let vector = vector::open(&config.vector_store, &config)?;
        let object = match config.object_store.as_deref() {
            Some(name) => Some(object::open(name, &config)?),
            None => None,
        };

        let database = DatabaseCache::new(Arc::clone(&scalar), vector);
        let data_manager = Arc::new(DataManager::new(
            database,
            object,
            config.memory_policy,
            config.memory_maxsize,
            config.normalize,
        ));

        let model_name = config.embedding_model.clone();
        let dimension = config.dimension;
        let dispatcher = EmbeddingDispatcher::new(
            move |_worker_id| embedder_from_config(&model_name, dimension),
            config.embedding_workers,
            dimension,
        )
        .map_err(|e| CacheError::Cache(e.to_string()))?;

        let evaluator = SimilarityEvaluator::new(
            config.metric,
            config.similarity_threshold,
            config.similarity_threshold_long,
        )
        .with_max_distance(config.max_distance);

        let audit = QueryLogSink::new(scalar, config.audit_workers);

        Ok(Self::new(
            data_manager,
            dispatcher,
            evaluator,
            audit,
            config.model_blacklist,
            config.top_k,
        ))
    }

    /// Replaces the query pre-embedding hook.
    pub fn with_query_pre(mut self, hook: QueryPreProcess) -> Self {
        self.query_pre = hook;
        self
    }

    /// Replaces the insert pre-embedding hook.
    pub fn with_insert_pre(mut self, hook: InsertPreProcess) -> Self {
        self.insert_pre = hook;
        self
    }

    /// Replaces the winner-selection hook.
    pub fn with_post_process(mut self, hook: PostProcess) -> Self {
        self.post_process = hook;
        self
    }

    /// The underlying data manager.
    pub fn data_manager(&self) -> &Arc<DataManager> {
        &self.data_manager
    }

    /// Handles one request. Never fails: every outcome is a response body.
    #[instrument(skip_all, fields(request_type = tracing::field::Empty, model = tracing::field::Empty))]
    pub async fn handle(&self, request: Value) -> Value {
        let start = Instant::now();

        let request_type = request.get("type").and_then(Value::as_str);
        let model_raw = request
            .get("scope")
            .and_then(|scope| scope.get("model"))
            .and_then(Value::as_str);

        let response = match request_type {
            Some(request_type) if REQUEST_TYPES.contains(&request_type) => {
                tracing::Span::current().record("request_type", request_type);
                match model_raw {
                    None => query_error(ERR_PARSE, "scope.model is required"),
                    Some(model_raw) => {
                        let model = normalize_model_scope(model_raw);
                        tracing::Span::current().record("model", model.as_str());

                        match self.blacklist_filter(&model, request_type) {
                            Some(filtered) => filtered,
                            None => match request_type {
                                "query" => self.handle_query(&model, &request, start).await,
                                "insert" => self.handle_insert(&model, &request).await,
                                "remove" => self.handle_remove(&model, &request).await,
                                "register" => self.handle_register(&model).await,
                                _ => json!({"errorCode": ERR_BAD_REQUEST, "errorDesc": "bad request"}),
                            },
                        }
                    }
                }
            }
            _ => query_error(
                ERR_BAD_TYPE,
                "type exception, should one of ['query', 'insert', 'remove', 'register']",
            ),
        };

        self.submit_audit(&request, &response, model_raw, start);
        response
    }

    /// Short-circuits blacklisted models on the write/read paths.
    fn blacklist_filter(&self, model: &str, request_type: &str) -> Option<Value> {
        if !self.blacklist.contains(model) {
            return None;
        }
        match request_type {
            "query" => {
                info!(model, "Query refused: model blacklisted");
                Some(query_error(
                    ERR_GENERIC,
                    format!("model '{model}' is blacklisted"),
                ))
            }
            "insert" => {
                info!(model, "Insert refused: model blacklisted");
                Some(insert_error(
                    ERR_GENERIC,
                    format!("model '{model}' is blacklisted"),
                ))
            }
            _ => None,
        }
    }

    async fn handle_query(&self, model: &str, request: &Value, start: Instant) -> Value {
        let Some(query) = request.get("query") else {
            return query_error(ERR_QUERY_ADAPTER, "query is required");
        };

        let text = (self.query_pre)(query);
        let query_len = text.chars().count();

        let embedding = match self.dispatcher.embed(&text).await {
            Ok(embedding) => embedding,
            Err(e) => return query_error(ERR_QUERY_ADAPTER, e.to_string()),
        };

        let hits = match self
            .data_manager
            .search(&embedding, model, self.top_k)
            .await
        {
            Ok(hits) => hits,
            Err(e) => return query_error(ERR_QUERY_ADAPTER, e.to_string()),
        };

        // Candidates resolve concurrently; the slowest single fetch bounds
        // the latency instead of the sum.
        let fetches = join_all(
            hits.iter()
                .map(|hit| self.data_manager.get_scalar_data(hit, model)),
        )
        .await;

        let normalized = self.data_manager.normalizes();
        let mut accepted: Vec<(i64, String, String)> = Vec::new();
        for (hit, fetched) in hits.iter().zip(fetches) {
            let record = match fetched {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => return query_error(ERR_QUERY_FATAL, e.to_string()),
            };

            let score = self.evaluator.evaluate(hit.distance, normalized);
            if !self.evaluator.accept(score, query_len) {
                debug!(id = hit.id, score, "Candidate below threshold");
                continue;
            }

            let answer = record
                .answers
                .first()
                .map(|a| a.value.clone())
                .unwrap_or_default();
            accepted.push((record.id, record.question.content, answer));
        }

        let pairs: Vec<(String, String)> = accepted
            .iter()
            .map(|(_, question, answer)| (question.clone(), answer.clone()))
            .collect();

        let Some((hit_query, answer)) = (self.post_process)(&pairs) else {
            return query_miss(&format_delta(start.elapsed().as_secs_f64()));
        };

        if let Some((id, _, _)) = accepted
            .iter()
            .find(|(_, question, ans)| *question == hit_query && *ans == answer)
        {
            if let Err(e) = self.data_manager.update_hit_count(*id).await {
                warn!(id = *id, error = %e, "Hit-count update failed");
            }
        }

        info!(model, hit_query = %hit_query, "Cache hit");
        query_hit(
            &format_delta(start.elapsed().as_secs_f64()),
            &hit_query,
            &answer,
        )
    }

    async fn handle_insert(&self, model: &str, request: &Value) -> Value {
        let Some(chat_info) = request.get("chat_info") else {
            return insert_error(ERR_INSERT_FAILED, "chat_info is required");
        };
        let Some(turns) = chat_info.as_array().filter(|turns| !turns.is_empty()) else {
            return insert_error(ERR_INSERT_FAILED, "chat_info must be a non-empty array");
        };

        let text = (self.insert_pre)(chat_info);
        if text.is_empty() {
            return insert_error(ERR_INSERT_FAILED, "empty question text");
        }

        let Some(answer) = turns
            .last()
            .and_then(|turn| turn.get("answer"))
            .and_then(Value::as_str)
        else {
            return insert_error(ERR_INSERT_FAILED, "chat_info is missing an answer");
        };

        let embedding = match self.dispatcher.embed(&text).await {
            Ok(embedding) => embedding,
            Err(e) => return insert_error(ERR_INSERT_ADAPTER, e.to_string()),
        };

        match self
            .data_manager
            .save(
                vec![Question::new(&text)],
                vec![Answer::text(answer)],
                vec![embedding],
                model,
            )
            .await
        {
            Ok(ids) => {
                info!(model, ?ids, "Insert complete");
                insert_success()
            }
            Err(e) => insert_error(ERR_INSERT_ADAPTER, e.to_string()),
        }
    }

    async fn handle_remove(&self, model: &str, request: &Value) -> Value {
        let remove_type = request.get("remove_type").and_then(Value::as_str);

        let result = match remove_type {
            Some("single") => {
                let ids: Vec<i64> = request
                    .get("id_list")
                    .and_then(Value::as_array)
                    .map(|list| list.iter().filter_map(Value::as_i64).collect())
                    .unwrap_or_default();
                if ids.is_empty() {
                    return remove_shape_error("id_list_error");
                }
                self.data_manager.delete(&ids, model).await
            }
            Some("all") => self.data_manager.truncate(model).await,
            _ => return remove_shape_error("remove_type_error"),
        };

        let code = if result.is_success() {
            ERR_SUCCESS
        } else {
            ERR_REMOVE_FAILED
        };
        match serde_json::to_value(&result) {
            Ok(body) => remove_result(code, body),
            Err(e) => remove_shape_error(&format!("remove serialization failed: {e}")),
        }
    }

    async fn handle_register(&self, model: &str) -> Value {
        match self.data_manager.create_vector(model).await {
            Ok(CreateStatus::Created) => {
                info!(model, "Collection registered");
                register_result(ERR_SUCCESS, "create_success")
            }
            Ok(CreateStatus::AlreadyExists) => register_result(ERR_SUCCESS, "already_exists"),
            Err(e) => {
                warn!(model, error = %e, "Register failed");
                register_result(ERR_REGISTER_FAILED, &format!("create index error: {e}"))
            }
        }
    }

    /// Builds the audit record out of the final response and submits it;
    /// never affects the response.
    fn submit_audit(&self, request: &Value, response: &Value, model: Option<&str>, start: Instant) {
        let query_json = request
            .get("query")
            .or_else(|| request.get("chat_info"))
            .map(|v| v.to_string())
            .unwrap_or_default();

        let hit_query = match response.get("hit_query") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let record = QueryLogRecord {
            error_code: response
                .get("errorCode")
                .and_then(Value::as_i64)
                .unwrap_or(ERR_GENERIC),
            error_desc: response
                .get("errorDesc")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            cache_hit: response
                .get("cacheHit")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            model: model.map(normalize_model_scope).unwrap_or_default(),
            query: query_json,
            delta_time: (start.elapsed().as_secs_f64() * 100.0).round() / 100.0,
            hit_query,
            answer: response
                .get("answer")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            created_at: chrono::Utc::now(),
        };

        self.audit.submit(record);
    }

    /// Shuts the engine down in reverse construction order: audit sink,
    /// embedding pool, then the data tiers. Idempotent.
    pub async fn close(&self) {
        self.audit.close();
        self.dispatcher.close();
        self.data_manager.close().await;
    }
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("dispatcher", &self.dispatcher)
            .field("evaluator", &self.evaluator)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}
