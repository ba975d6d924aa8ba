//! Response bodies and the fixed error-code table.

use serde_json::{Value, json};

/// Success.
pub const ERR_SUCCESS: i64 = 0;
/// Generic failure.
pub const ERR_GENERIC: i64 = 101;
/// Unknown request type.
pub const ERR_BAD_TYPE: i64 = 102;
/// Request parse failure.
pub const ERR_PARSE: i64 = 103;
/// Query adapter failure (embedding / vector search).
pub const ERR_QUERY_ADAPTER: i64 = 201;
/// Query pipeline failure past the adapter boundary.
pub const ERR_QUERY_FATAL: i64 = 202;
/// Insert request validation failure.
pub const ERR_INSERT_FAILED: i64 = 301;
/// Insert adapter failure (embedding / store write).
pub const ERR_INSERT_ADAPTER: i64 = 302;
/// Insert response-shaping failure.
pub const ERR_INSERT_FATAL: i64 = 303;
/// Remove request shape failure.
pub const ERR_REMOVE_ADAPTER: i64 = 401;
/// Remove execution failure.
pub const ERR_REMOVE_FAILED: i64 = 402;
/// Register failure.
pub const ERR_REGISTER_FAILED: i64 = 502;
/// Malformed request.
pub const ERR_BAD_REQUEST: i64 = 400;

/// Query-shaped error/miss body with zeroed timing.
pub fn query_error(code: i64, desc: impl Into<String>) -> Value {
    json!({
        "errorCode": code,
        "errorDesc": desc.into(),
        "cacheHit": false,
        "delta_time": 0,
        "hit_query": "",
        "answer": "",
    })
}

/// Query miss.
pub fn query_miss(delta_time: &str) -> Value {
    json!({
        "errorCode": ERR_SUCCESS,
        "errorDesc": "",
        "cacheHit": false,
        "delta_time": delta_time,
        "hit_query": "",
        "answer": "",
    })
}

/// Query hit.
pub fn query_hit(delta_time: &str, hit_query: &str, answer: &str) -> Value {
    json!({
        "errorCode": ERR_SUCCESS,
        "errorDesc": "",
        "cacheHit": true,
        "delta_time": delta_time,
        "hit_query": hit_query,
        "answer": answer,
    })
}

/// Successful insert.
pub fn insert_success() -> Value {
    json!({
        "errorCode": ERR_SUCCESS,
        "errorDesc": "",
        "writeStatus": "success",
    })
}

/// Failed insert.
pub fn insert_error(code: i64, desc: impl Into<String>) -> Value {
    json!({
        "errorCode": code,
        "errorDesc": desc.into(),
        "writeStatus": "exception",
    })
}

/// Remove outcome wrapping the per-tier status.
pub fn remove_result(code: i64, response: Value) -> Value {
    json!({
        "errorCode": code,
        "errorDesc": "",
        "response": response,
        "writeStatus": if code == ERR_SUCCESS { "success" } else { "exception" },
    })
}

/// Malformed remove request (bad `remove_type` / `id_list`).
pub fn remove_shape_error(response: &str) -> Value {
    json!({
        "errorCode": ERR_REMOVE_ADAPTER,
        "errorDesc": "",
        "response": response,
        "removeStatus": "exception",
    })
}

/// Register outcome.
pub fn register_result(code: i64, response: &str) -> Value {
    json!({
        "errorCode": code,
        "errorDesc": "",
        "response": response,
        "writeStatus": if code == ERR_SUCCESS { "success" } else { "exception" },
    })
}
