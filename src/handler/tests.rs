use std::sync::Arc;

use serde_json::{Value, json};

use super::{RequestHandler, normalize_model_scope};
use crate::audit::QueryLogSink;
use crate::embedding::{EmbeddingDispatcher, EmbeddingError, HashEmbedder, TextEmbedder};
use crate::eviction::PolicyKind;
use crate::manager::{DataManager, DatabaseCache};
use crate::scalar::{ScalarStore, SqliteScalarStore};
use crate::similarity::SimilarityEvaluator;
use crate::vector::{FlatVectorStore, Metric, VectorStore};

const DIM: usize = 64;

fn build_handler(blacklist: Vec<String>) -> RequestHandler {
    let scalar: Arc<dyn ScalarStore> =
        Arc::new(SqliteScalarStore::open_in_memory().expect("sqlite"));
    let vector: Arc<dyn VectorStore> = Arc::new(FlatVectorStore::new(DIM, Metric::Cosine));
    let database = DatabaseCache::new(Arc::clone(&scalar), vector);
    let data_manager = Arc::new(DataManager::new(
        database,
        None,
        PolicyKind::WTinyLfu,
        1024,
        false,
    ));

    let dispatcher = EmbeddingDispatcher::new(
        |_| -> Result<Box<dyn TextEmbedder>, EmbeddingError> {
            Ok(Box::new(HashEmbedder::new(DIM)?))
        },
        1,
        DIM,
    )
    .expect("dispatcher");

    let evaluator = SimilarityEvaluator::new(Metric::Cosine, 0.95, 0.95);
    let audit = QueryLogSink::new(scalar, 2);

    RequestHandler::new(data_manager, dispatcher, evaluator, audit, blacklist, 5)
}

fn insert_request(model: &str, query: &str, answer: &str) -> Value {
    json!({
        "type": "insert",
        "scope": {"model": model},
        "chat_info": [{"query": query, "answer": answer}],
    })
}

fn query_request(model: &str, query: &str) -> Value {
    json!({
        "type": "query",
        "scope": {"model": model},
        "query": query,
    })
}

#[test]
fn test_model_scope_normalization() {
    assert_eq!(normalize_model_scope("gpt-4.1"), "gpt_4_1");
    assert_eq!(normalize_model_scope("llama-3.1-70b"), "llama_3_1_70b");
    assert_eq!(normalize_model_scope("plain"), "plain");
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let handler = build_handler(Vec::new());

    let first = handler
        .handle(json!({"type": "register", "scope": {"model": "gpt-4.1"}}))
        .await;
    assert_eq!(first["errorCode"], 0);
    assert_eq!(first["response"], "create_success");
    assert_eq!(first["writeStatus"], "success");

    let second = handler
        .handle(json!({"type": "register", "scope": {"model": "gpt-4.1"}}))
        .await;
    assert_eq!(second["errorCode"], 0);
    assert_eq!(second["response"], "already_exists");
}

#[tokio::test]
async fn test_insert_then_query_hits() {
    let handler = build_handler(Vec::new());

    let insert = handler.handle(insert_request("gpt-4.1", "hi", "hello")).await;
    assert_eq!(insert["errorCode"], 0);
    assert_eq!(insert["writeStatus"], "success");

    let query = handler.handle(query_request("gpt-4.1", "hi")).await;
    assert_eq!(query["errorCode"], 0);
    assert_eq!(query["cacheHit"], true);
    assert_eq!(query["answer"], "hello");
    assert_eq!(query["hit_query"], "hi");
    let delta = query["delta_time"].as_str().expect("delta_time string");
    assert!(delta.ends_with('s'));
}

#[tokio::test]
async fn test_model_scope_aliases_share_entries() {
    let handler = build_handler(Vec::new());
    handler.handle(insert_request("gpt-4.1", "hi", "hello")).await;

    // The same scope spelled with the separators already normalized.
    let query = handler.handle(query_request("gpt_4_1", "hi")).await;
    assert_eq!(query["cacheHit"], true);
}

#[tokio::test]
async fn test_dissimilar_query_misses() {
    let handler = build_handler(Vec::new());
    handler.handle(insert_request("m", "hi", "hello")).await;

    let query = handler
        .handle(query_request("m", "completely unrelated question"))
        .await;
    assert_eq!(query["errorCode"], 0);
    assert_eq!(query["cacheHit"], false);
    assert_eq!(query["answer"], "");
}

#[tokio::test]
async fn test_queries_are_isolated_per_model() {
    let handler = build_handler(Vec::new());
    handler.handle(insert_request("model-a", "hi", "hello")).await;

    let query = handler.handle(query_request("model-b", "hi")).await;
    assert_eq!(query["cacheHit"], false);
}

#[tokio::test]
async fn test_misspelled_type_is_rejected() {
    let handler = build_handler(Vec::new());
    let response = handler
        .handle(json!({"type": "queyr", "scope": {"model": "m"}, "query": "hi"}))
        .await;

    assert_eq!(response["errorCode"], 102);
    assert_eq!(response["cacheHit"], false);
    assert_eq!(response["delta_time"], 0);
}

#[tokio::test]
async fn test_missing_model_is_a_parse_error() {
    let handler = build_handler(Vec::new());

    let no_scope = handler.handle(json!({"type": "query", "query": "hi"})).await;
    assert_eq!(no_scope["errorCode"], 103);

    let no_model = handler
        .handle(json!({"type": "query", "scope": {}, "query": "hi"}))
        .await;
    assert_eq!(no_model["errorCode"], 103);
}

#[tokio::test]
async fn test_query_without_query_field_is_adapter_error() {
    let handler = build_handler(Vec::new());
    let response = handler
        .handle(json!({"type": "query", "scope": {"model": "m"}}))
        .await;
    assert_eq!(response["errorCode"], 201);
    assert_eq!(response["cacheHit"], false);
}

#[tokio::test]
async fn test_insert_validation_errors() {
    let handler = build_handler(Vec::new());

    let missing = handler
        .handle(json!({"type": "insert", "scope": {"model": "m"}}))
        .await;
    assert_eq!(missing["errorCode"], 301);
    assert_eq!(missing["writeStatus"], "exception");

    let empty = handler
        .handle(json!({"type": "insert", "scope": {"model": "m"}, "chat_info": []}))
        .await;
    assert_eq!(empty["errorCode"], 301);

    let no_answer = handler
        .handle(json!({
            "type": "insert",
            "scope": {"model": "m"},
            "chat_info": [{"query": "hi"}],
        }))
        .await;
    assert_eq!(no_answer["errorCode"], 301);
}

#[tokio::test]
async fn test_remove_single_deletes_the_entry() {
    let handler = build_handler(Vec::new());
    handler.handle(insert_request("m", "hi", "hello")).await;

    // Recover the assigned id through the data manager.
    let ids = handler
        .data_manager()
        .database()
        .scalar()
        .get_ids(false)
        .await
        .expect("ids");
    assert_eq!(ids.len(), 1);

    let response = handler
        .handle(json!({
            "type": "remove",
            "scope": {"model": "m"},
            "remove_type": "single",
            "id_list": [ids[0]],
        }))
        .await;
    assert_eq!(response["errorCode"], 0);
    assert_eq!(response["writeStatus"], "success");
    assert_eq!(response["response"]["status"], "success");
    assert_eq!(response["response"]["VectorDB"], "delete_count: 1");
    assert_eq!(response["response"]["ScalarDB"], "delete_count: 1");

    let query = handler.handle(query_request("m", "hi")).await;
    assert_eq!(query["cacheHit"], false);
}

#[tokio::test]
async fn test_remove_all_truncates_the_scope() {
    let handler = build_handler(Vec::new());
    handler.handle(insert_request("m", "hi", "hello")).await;
    handler.handle(insert_request("m", "bye", "goodbye")).await;

    let response = handler
        .handle(json!({
            "type": "remove",
            "scope": {"model": "m"},
            "remove_type": "all",
        }))
        .await;
    assert_eq!(response["errorCode"], 0);
    assert_eq!(response["response"]["VectorDB"], "rebuild");

    let query = handler.handle(query_request("m", "hi")).await;
    assert_eq!(query["cacheHit"], false);
}

#[tokio::test]
async fn test_remove_shape_errors() {
    let handler = build_handler(Vec::new());

    let bad_type = handler
        .handle(json!({
            "type": "remove",
            "scope": {"model": "m"},
            "remove_type": "some",
        }))
        .await;
    assert_eq!(bad_type["errorCode"], 401);
    assert_eq!(bad_type["response"], "remove_type_error");
    assert_eq!(bad_type["removeStatus"], "exception");

    let empty_ids = handler
        .handle(json!({
            "type": "remove",
            "scope": {"model": "m"},
            "remove_type": "single",
            "id_list": [],
        }))
        .await;
    assert_eq!(empty_ids["errorCode"], 401);
    assert_eq!(empty_ids["response"], "id_list_error");
}

#[tokio::test]
async fn test_blacklisted_model_is_refused() {
    let handler = build_handler(vec!["blocked_model".to_string()]);

    let query = handler.handle(query_request("blocked-model", "hi")).await;
    assert_eq!(query["errorCode"], 101);
    assert_eq!(query["cacheHit"], false);

    let insert = handler
        .handle(insert_request("blocked.model", "hi", "hello"))
        .await;
    assert_eq!(insert["errorCode"], 101);
    assert_eq!(insert["writeStatus"], "exception");

    // Register and remove are not filtered.
    let register = handler
        .handle(json!({"type": "register", "scope": {"model": "blocked-model"}}))
        .await;
    assert_eq!(register["errorCode"], 0);
}

#[tokio::test]
async fn test_repeated_hits_update_hit_count() {
    let handler = build_handler(Vec::new());
    handler.handle(insert_request("m", "hi", "hello")).await;

    for _ in 0..3 {
        let query = handler.handle(query_request("m", "hi")).await;
        assert_eq!(query["cacheHit"], true);
    }
}

#[tokio::test]
async fn test_close_is_idempotent_and_queries_degrade() {
    let handler = build_handler(Vec::new());
    handler.handle(insert_request("m", "hi", "hello")).await;

    handler.close().await;
    handler.close().await;

    // The embedding pool is gone: queries degrade to an error response
    // instead of panicking.
    let query = handler.handle(query_request("m", "hi")).await;
    assert_eq!(query["errorCode"], 201);
    assert_eq!(query["cacheHit"], false);
}
