//! SQLite-backed scalar store.
//!
//! One `modelcache_llm_answer` row per cache entry plus a
//! `modelcache_query_log` audit table. Deletion is a tombstone
//! (`is_deleted`); rows are purged by [`ScalarStore::clear_deleted_data`] or
//! a per-model truncate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, params};
use tracing::debug;

use super::ScalarStore;
use super::error::ScalarStoreError;
use super::model::{Answer, AnswerType, CacheData, Question, QueryLogRecord, ScalarRecord};
use crate::vector::f32_to_embedding_bytes;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS modelcache_llm_answer (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    gmt_create      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    gmt_modified    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    question        TEXT NOT NULL,
    answer          TEXT NOT NULL,
    answer_type     INTEGER NOT NULL,
    hit_count       INTEGER NOT NULL DEFAULT 0,
    model           VARCHAR(1000) NOT NULL,
    embedding_data  BLOB NOT NULL,
    is_deleted      INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_llm_answer_model ON modelcache_llm_answer(model);

CREATE TABLE IF NOT EXISTS modelcache_query_log (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    gmt_create      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    gmt_modified    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    error_code      INTEGER NOT NULL,
    error_desc      VARCHAR(1000) NOT NULL,
    cache_hit       VARCHAR(100) NOT NULL,
    delta_time      REAL NOT NULL,
    model           VARCHAR(1000) NOT NULL,
    query           TEXT NOT NULL,
    hit_query       TEXT NOT NULL,
    answer          TEXT NOT NULL
);
"#;

/// Scalar tier on a local SQLite database.
pub struct SqliteScalarStore {
    conn: Arc<Mutex<Connection>>,
    closed: AtomicBool,
    path: String,
}

impl SqliteScalarStore {
    /// Opens (or creates) the database at `path` with WAL mode.
    pub fn open(path: &str) -> Result<Self, ScalarStoreError> {
        let conn = Connection::open(path).map_err(|e| ScalarStoreError::OpenFailed {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "busy_timeout", 5000).ok();

        Self::from_connection(conn, path)
    }

    /// Opens an in-memory database (tests).
    pub fn open_in_memory() -> Result<Self, ScalarStoreError> {
        let conn = Connection::open_in_memory().map_err(|e| ScalarStoreError::OpenFailed {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        Self::from_connection(conn, ":memory:")
    }

    fn from_connection(conn: Connection, path: &str) -> Result<Self, ScalarStoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| ScalarStoreError::OpenFailed {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            closed: AtomicBool::new(false),
            path: path.to_string(),
        })
    }

    /// Database location.
    pub fn path(&self) -> &str {
        &self.path
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, ScalarStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ScalarStoreError> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(ScalarStoreError::Closed);
        }
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| ScalarStoreError::ReadFailed {
            message: format!("blocking task failed: {e}"),
        })?
    }
}

impl std::fmt::Debug for SqliteScalarStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteScalarStore")
            .field("path", &self.path)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

/// Encodes a question for the `question` column: plain content when
/// unstructured, JSON otherwise.
fn encode_question(question: &Question) -> Result<String, ScalarStoreError> {
    match &question.deps {
        None => Ok(question.content.clone()),
        Some(_) => serde_json::to_string(question).map_err(|e| ScalarStoreError::InsertFailed {
            message: format!("question serialization failed: {e}"),
        }),
    }
}

fn decode_question(raw: &str) -> Question {
    serde_json::from_str::<Question>(raw).unwrap_or_else(|_| Question::new(raw))
}

#[async_trait]
impl ScalarStore for SqliteScalarStore {
    async fn batch_insert(
        &self,
        records: Vec<CacheData>,
        model: &str,
    ) -> Result<Vec<i64>, ScalarStoreError> {
        let model = model.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "INSERT INTO modelcache_llm_answer \
                 (question, answer, answer_type, model, embedding_data) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            let mut ids = Vec::with_capacity(records.len());
            for record in &records {
                let answer = record.answers.first().ok_or_else(|| {
                    ScalarStoreError::InsertFailed {
                        message: "at least one answer is required".to_string(),
                    }
                })?;
                let question = encode_question(&record.question)?;
                let embedding_bytes = record
                    .embedding
                    .as_deref()
                    .map(f32_to_embedding_bytes)
                    .unwrap_or_default();

                stmt.execute(params![
                    question,
                    answer.value,
                    answer.answer_type.as_i64(),
                    model,
                    embedding_bytes,
                ])
                .map_err(|e| ScalarStoreError::InsertFailed {
                    message: e.to_string(),
                })?;
                ids.push(conn.last_insert_rowid());
            }

            debug!(count = ids.len(), model = %model, "Inserted scalar rows");
            Ok(ids)
        })
        .await
    }

    async fn insert_query_resp(&self, record: QueryLogRecord) -> Result<(), ScalarStoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO modelcache_query_log \
                 (gmt_create, error_code, error_desc, cache_hit, delta_time, model, query, hit_query, answer) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.created_at.to_rfc3339(),
                    record.error_code,
                    record.error_desc,
                    if record.cache_hit { "true" } else { "false" },
                    record.delta_time,
                    record.model,
                    record.query,
                    record.hit_query,
                    record.answer,
                ],
            )
            .map_err(|e| ScalarStoreError::InsertFailed {
                message: e.to_string(),
            })?;
            Ok(())
        })
        .await
    }

    async fn get_data_by_id(&self, id: i64) -> Result<Option<ScalarRecord>, ScalarStoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT question, answer, answer_type, embedding_data, model \
                 FROM modelcache_llm_answer WHERE id = ?1 AND is_deleted = 0",
            )?;

            let mut rows = stmt.query(params![id])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };

            let question: String = row.get(0)?;
            let answer: String = row.get(1)?;
            let answer_type: i64 = row.get(2)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            let model: String = row.get(4)?;

            let answer_type =
                AnswerType::from_i64(answer_type).ok_or(ScalarStoreError::CorruptRow {
                    id,
                    message: format!("unknown answer_type {answer_type}"),
                })?;

            Ok(Some(ScalarRecord {
                id,
                question: decode_question(&question),
                answers: vec![Answer {
                    value: answer,
                    answer_type,
                }],
                embedding_bytes,
                model,
            }))
        })
        .await
    }

    async fn update_hit_count_by_id(&self, id: i64) -> Result<(), ScalarStoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE modelcache_llm_answer \
                 SET hit_count = hit_count + 1, gmt_modified = CURRENT_TIMESTAMP \
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
    }

    async fn mark_deleted(&self, ids: &[i64]) -> Result<usize, ScalarStoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "UPDATE modelcache_llm_answer \
                 SET is_deleted = 1, gmt_modified = CURRENT_TIMESTAMP \
                 WHERE id IN ({placeholders}) AND is_deleted = 0"
            );
            let changed = conn
                .execute(&sql, rusqlite::params_from_iter(ids.iter()))
                .map_err(|e| ScalarStoreError::DeleteFailed {
                    message: e.to_string(),
                })?;
            Ok(changed)
        })
        .await
    }

    async fn model_deleted(&self, model: &str) -> Result<usize, ScalarStoreError> {
        let model = model.to_string();
        self.with_conn(move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM modelcache_llm_answer WHERE model = ?1",
                    params![model],
                )
                .map_err(|e| ScalarStoreError::DeleteFailed {
                    message: e.to_string(),
                })?;
            debug!(model = %model, deleted, "Truncated scalar rows for model");
            Ok(deleted)
        })
        .await
    }

    async fn clear_deleted_data(&self) -> Result<usize, ScalarStoreError> {
        self.with_conn(|conn| {
            let purged = conn
                .execute("DELETE FROM modelcache_llm_answer WHERE is_deleted = 1", [])
                .map_err(|e| ScalarStoreError::DeleteFailed {
                    message: e.to_string(),
                })?;
            Ok(purged)
        })
        .await
    }

    async fn get_ids(&self, include_deleted: bool) -> Result<Vec<i64>, ScalarStoreError> {
        self.with_conn(move |conn| {
            let sql = if include_deleted {
                "SELECT id FROM modelcache_llm_answer"
            } else {
                "SELECT id FROM modelcache_llm_answer WHERE is_deleted = 0"
            };
            let mut stmt = conn.prepare(sql)?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
        .await
    }

    async fn count(&self) -> Result<usize, ScalarStoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM modelcache_llm_answer WHERE is_deleted = 0",
                [],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }

    async fn flush(&self) -> Result<(), ScalarStoreError> {
        self.with_conn(|conn| {
            conn.query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))
                .ok();
            Ok(())
        })
        .await
    }

    async fn close(&self) -> Result<(), ScalarStoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
