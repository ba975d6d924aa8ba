//! End-to-end pipeline tests: the engine assembled from a config, driven
//! through the JSON request surface.

use serde_json::json;

use semcache::{Config, Metric, RequestHandler};

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        sqlite_path: dir
            .path()
            .join("semcache.db")
            .to_string_lossy()
            .into_owned(),
        dimension: 64,
        ..Config::default()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_full_lifecycle_register_insert_query_remove() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let handler = RequestHandler::from_config(test_config(&dir)).await?;

    // Register normalizes the scope and is idempotent.
    let register = handler
        .handle(json!({"type": "register", "scope": {"model": "gpt-4.1"}}))
        .await;
    assert_eq!(register["errorCode"], 0);
    assert_eq!(register["response"], "create_success");

    let again = handler
        .handle(json!({"type": "register", "scope": {"model": "gpt-4.1"}}))
        .await;
    assert_eq!(again["response"], "already_exists");

    // Insert, then an identical query hits.
    let insert = handler
        .handle(json!({
            "type": "insert",
            "scope": {"model": "gpt-4.1"},
            "chat_info": [{"query": "what is rust", "answer": "a systems language"}],
        }))
        .await;
    assert_eq!(insert["errorCode"], 0);
    assert_eq!(insert["writeStatus"], "success");

    let hit = handler
        .handle(json!({
            "type": "query",
            "scope": {"model": "gpt-4.1"},
            "query": "what is rust",
        }))
        .await;
    assert_eq!(hit["errorCode"], 0);
    assert_eq!(hit["cacheHit"], true);
    assert_eq!(hit["answer"], "a systems language");
    assert_eq!(hit["hit_query"], "what is rust");

    // Remove everything under the scope; the hit disappears.
    let removed = handler
        .handle(json!({
            "type": "remove",
            "scope": {"model": "gpt-4.1"},
            "remove_type": "all",
        }))
        .await;
    assert_eq!(removed["errorCode"], 0);
    assert_eq!(removed["response"]["status"], "success");

    let miss = handler
        .handle(json!({
            "type": "query",
            "scope": {"model": "gpt-4.1"},
            "query": "what is rust",
        }))
        .await;
    assert_eq!(miss["cacheHit"], false);

    handler.close().await;
    Ok(())
}

#[tokio::test]
async fn test_multiple_entries_stay_isolated_per_model() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let handler = RequestHandler::from_config(test_config(&dir)).await?;

    for (model, query, answer) in [
        ("model-a", "hi", "hello from a"),
        ("model-b", "hi", "hello from b"),
    ] {
        let insert = handler
            .handle(json!({
                "type": "insert",
                "scope": {"model": model},
                "chat_info": [{"query": query, "answer": answer}],
            }))
            .await;
        assert_eq!(insert["errorCode"], 0);
    }

    let hit_a = handler
        .handle(json!({"type": "query", "scope": {"model": "model-a"}, "query": "hi"}))
        .await;
    assert_eq!(hit_a["answer"], "hello from a");

    let hit_b = handler
        .handle(json!({"type": "query", "scope": {"model": "model-b"}, "query": "hi"}))
        .await;
    assert_eq!(hit_b["answer"], "hello from b");

    handler.close().await;
    Ok(())
}

#[tokio::test]
async fn test_normalized_l2_pipeline_hits_on_identical_text() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = Config {
        metric: Metric::L2,
        normalize: true,
        similarity_threshold: 0.9,
        similarity_threshold_long: 0.9,
        ..test_config(&dir)
    };
    let handler = RequestHandler::from_config(config).await?;

    let insert = handler
        .handle(json!({
            "type": "insert",
            "scope": {"model": "embedder-l2"},
            "chat_info": [{"query": "ping", "answer": "pong"}],
        }))
        .await;
    assert_eq!(insert["errorCode"], 0);

    // Identical text → identical normalized vector → zero L2 distance →
    // score 1.0, well above threshold.
    let hit = handler
        .handle(json!({"type": "query", "scope": {"model": "embedder-l2"}, "query": "ping"}))
        .await;
    assert_eq!(hit["cacheHit"], true);
    assert_eq!(hit["answer"], "pong");

    let miss = handler
        .handle(json!({
            "type": "query",
            "scope": {"model": "embedder-l2"},
            "query": "entirely different words",
        }))
        .await;
    assert_eq!(miss["cacheHit"], false);

    handler.close().await;
    Ok(())
}

#[tokio::test]
async fn test_unknown_store_names_fail_fast() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let config = Config {
        scalar_store: "mysql".to_string(),
        ..test_config(&dir)
    };
    assert!(RequestHandler::from_config(config).await.is_err());

    let config = Config {
        vector_store: "milvus".to_string(),
        ..test_config(&dir)
    };
    assert!(RequestHandler::from_config(config).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_persisted_entries_survive_engine_restart() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let handler = RequestHandler::from_config(test_config(&dir)).await?;
    let insert = handler
        .handle(json!({
            "type": "insert",
            "scope": {"model": "m"},
            "chat_info": [{"query": "durable", "answer": "row"}],
        }))
        .await;
    assert_eq!(insert["errorCode"], 0);
    handler.close().await;

    // A fresh engine over the same sqlite file sees the scalar rows. The
    // in-process vector index starts empty, so the lookup itself misses;
    // the durable tier is authoritative.
    let reopened = RequestHandler::from_config(test_config(&dir)).await?;
    let ids = reopened
        .data_manager()
        .database()
        .scalar()
        .get_ids(false)
        .await?;
    assert_eq!(ids.len(), 1);

    let miss = reopened
        .handle(json!({"type": "query", "scope": {"model": "m"}, "query": "durable"}))
        .await;
    assert_eq!(miss["cacheHit"], false);

    reopened.close().await;
    Ok(())
}
