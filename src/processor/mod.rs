//! Pre-embedding and post-lookup processing hooks.
//!
//! The handler composes these as `Arc<dyn Fn>` values so deployments can
//! swap in their own text shaping without touching the pipeline.


use std::sync::Arc;

use serde_json::Value;

/// Turns the raw query payload into the text handed to the embedder.
pub type QueryPreProcess = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Turns the insert `chat_info` payload into the question text to store.
pub type InsertPreProcess = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Picks the winning candidate among accepted `(question, answer)` pairs.
pub type PostProcess = Arc<dyn Fn(&[(String, String)]) -> Option<(String, String)> + Send + Sync>;

/// Separator used when splicing multi-turn content into one string.
pub const SPLICE_SEPARATOR: &str = "###";

/// Default query pre-process: the query string itself, trimmed.
///
/// A JSON array of chat turns is spliced with [`SPLICE_SEPARATOR`], taking
/// each turn's `content` (or `query`) field.
pub fn query_multi_splicing(query: &Value) -> String {
    match query {
        Value::String(s) => s.trim().to_string(),
        Value::Array(turns) => splice(turns, &["content", "query"]),
        other => other.to_string(),
    }
}

/// Default insert pre-process: splices every `chat_info[].query` field.
pub fn insert_multi_splicing(chat_info: &Value) -> String {
    match chat_info {
        Value::Array(turns) => splice(turns, &["query", "content"]),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn splice(turns: &[Value], keys: &[&str]) -> String {
    let parts: Vec<&str> = turns
        .iter()
        .filter_map(|turn| {
            keys.iter()
                .find_map(|key| turn.get(key).and_then(Value::as_str))
                .or_else(|| turn.as_str())
        })
        .collect();
    parts.join(SPLICE_SEPARATOR)
}

/// Default post-process: the first (best-ranked) accepted candidate.
pub fn first(candidates: &[(String, String)]) -> Option<(String, String)> {
    candidates.first().cloned()
}

/// Alternative post-process: a uniformly random accepted candidate.
pub fn random_one(candidates: &[(String, String)]) -> Option<(String, String)> {
    use rand::seq::IndexedRandom;
    candidates.choose(&mut rand::rng()).cloned()
}

/// Standard hook set: splicing pre-processors and first-winner selection.
pub fn defaults() -> (QueryPreProcess, InsertPreProcess, PostProcess) {
    (
        Arc::new(query_multi_splicing),
        Arc::new(insert_multi_splicing),
        Arc::new(first),
    )
}
