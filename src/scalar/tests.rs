use super::model::{Answer, AnswerType, CacheData, Dep, DepType, Question, QueryLogRecord};
use super::sqlite::SqliteScalarStore;
use super::{ScalarStore, ScalarStoreError};
use crate::vector::f32_to_embedding_bytes;

fn record(question: &str, answer: &str, embedding: Vec<f32>) -> CacheData {
    CacheData::new(Question::new(question), Answer::text(answer), embedding)
}

fn store() -> SqliteScalarStore {
    SqliteScalarStore::open_in_memory().expect("in-memory sqlite")
}

#[tokio::test]
async fn test_batch_insert_returns_ids_in_input_order() {
    let store = store();
    let ids = store
        .batch_insert(
            vec![
                record("q1", "a1", vec![1.0]),
                record("q2", "a2", vec![2.0]),
                record("q3", "a3", vec![3.0]),
            ],
            "gpt_4_1",
        )
        .await
        .expect("insert");

    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    for (id, question) in ids.iter().zip(["q1", "q2", "q3"]) {
        let row = store
            .get_data_by_id(*id)
            .await
            .expect("read")
            .expect("row present");
        assert_eq!(row.question.content, question);
        assert_eq!(row.model, "gpt_4_1");
    }
}

#[tokio::test]
async fn test_roundtrip_preserves_answer_and_embedding_bytes() {
    let store = store();
    let embedding = vec![0.25f32, -1.5, 3.0];
    let ids = store
        .batch_insert(vec![record("hi", "hello", embedding.clone())], "m")
        .await
        .expect("insert");

    let row = store
        .get_data_by_id(ids[0])
        .await
        .expect("read")
        .expect("row present");
    assert_eq!(row.answers[0].value, "hello");
    assert_eq!(row.answers[0].answer_type, AnswerType::Str);
    assert_eq!(row.embedding_bytes, f32_to_embedding_bytes(&embedding));
}

#[tokio::test]
async fn test_structured_question_roundtrip() {
    let store = store();
    let question = Question::with_deps(
        "what is in this image",
        vec![Dep {
            name: "image".to_string(),
            data: "handle-123".to_string(),
            dep_type: DepType::ImageUrl,
        }],
    );
    let ids = store
        .batch_insert(
            vec![CacheData::new(
                question.clone(),
                Answer::text("a cat"),
                vec![1.0],
            )],
            "m",
        )
        .await
        .expect("insert");

    let row = store
        .get_data_by_id(ids[0])
        .await
        .expect("read")
        .expect("row present");
    assert_eq!(row.question, question);
}

#[tokio::test]
async fn test_mark_deleted_tombstones_rows() {
    let store = store();
    let ids = store
        .batch_insert(
            vec![record("q1", "a1", vec![1.0]), record("q2", "a2", vec![2.0])],
            "m",
        )
        .await
        .expect("insert");

    let changed = store.mark_deleted(&ids[..1]).await.expect("tombstone");
    assert_eq!(changed, 1);

    assert!(store.get_data_by_id(ids[0]).await.expect("read").is_none());
    assert!(store.get_data_by_id(ids[1]).await.expect("read").is_some());

    assert_eq!(store.count().await.expect("count"), 1);
    assert_eq!(store.get_ids(false).await.expect("ids").len(), 1);
    assert_eq!(store.get_ids(true).await.expect("ids"), ids);

    // Tombstoning the same id again changes nothing.
    assert_eq!(store.mark_deleted(&ids[..1]).await.expect("tombstone"), 0);
}

#[tokio::test]
async fn test_clear_deleted_data_purges_tombstones() {
    let store = store();
    let ids = store
        .batch_insert(vec![record("q", "a", vec![1.0])], "m")
        .await
        .expect("insert");
    store.mark_deleted(&ids).await.expect("tombstone");

    assert_eq!(store.clear_deleted_data().await.expect("purge"), 1);
    assert!(store.get_ids(true).await.expect("ids").is_empty());
}

#[tokio::test]
async fn test_model_deleted_removes_only_that_scope() {
    let store = store();
    store
        .batch_insert(vec![record("q1", "a1", vec![1.0])], "model_a")
        .await
        .expect("insert");
    store
        .batch_insert(vec![record("q2", "a2", vec![2.0])], "model_b")
        .await
        .expect("insert");

    assert_eq!(store.model_deleted("model_a").await.expect("truncate"), 1);
    assert_eq!(store.count().await.expect("count"), 1);
}

#[tokio::test]
async fn test_update_hit_count_succeeds_for_live_row() {
    let store = store();
    let ids = store
        .batch_insert(vec![record("q", "a", vec![1.0])], "m")
        .await
        .expect("insert");

    store
        .update_hit_count_by_id(ids[0])
        .await
        .expect("hit count");
    assert!(store.get_data_by_id(ids[0]).await.expect("read").is_some());
}

#[tokio::test]
async fn test_insert_query_resp_accepts_audit_rows() {
    let store = store();
    store
        .insert_query_resp(QueryLogRecord {
            error_code: 0,
            error_desc: String::new(),
            cache_hit: true,
            model: "m".to_string(),
            query: "\"hi\"".to_string(),
            delta_time: 0.01,
            hit_query: "hi".to_string(),
            answer: "hello".to_string(),
            created_at: chrono::Utc::now(),
        })
        .await
        .expect("audit insert");
}

#[tokio::test]
async fn test_insert_without_answer_is_rejected() {
    let store = store();
    let result = store
        .batch_insert(
            vec![CacheData {
                question: Question::new("q"),
                answers: Vec::new(),
                embedding: Some(vec![1.0]),
            }],
            "m",
        )
        .await;
    assert!(matches!(result, Err(ScalarStoreError::InsertFailed { .. })));
}

#[tokio::test]
async fn test_operations_fail_after_close() {
    let store = store();
    store.close().await.expect("close");
    store.close().await.expect("close is idempotent");

    let result = store.get_data_by_id(1).await;
    assert!(matches!(result, Err(ScalarStoreError::Closed)));
}
