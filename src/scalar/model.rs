//! Question / answer data model persisted by the scalar tier.

use serde::{Deserialize, Serialize};

/// Payload kind of an [`Answer`] or a [`Dep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepType {
    /// Plain text.
    Str,
    /// Inline base64-encoded image.
    ImageBase64,
    /// Remote image referenced by URL.
    ImageUrl,
}

impl DepType {
    /// Integer form stored in the `answer_type` column.
    pub fn as_i64(self) -> i64 {
        match self {
            DepType::Str => 0,
            DepType::ImageBase64 => 1,
            DepType::ImageUrl => 2,
        }
    }

    /// Parses the integer column form.
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(DepType::Str),
            1 => Some(DepType::ImageBase64),
            2 => Some(DepType::ImageUrl),
            _ => None,
        }
    }
}

/// Payload kind of an [`Answer`].
pub type AnswerType = DepType;

/// Auxiliary input attached to a structured question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dep {
    /// Dependency name.
    pub name: String,
    /// Payload, or an object-store handle after resolution.
    pub data: String,
    /// Payload kind.
    pub dep_type: DepType,
}

/// A cached question: plain content plus optional ordered deps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question text fed to the embedder.
    pub content: String,
    /// Ordered dependencies, if the question is structured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<Dep>>,
}

impl Question {
    /// Plain-string question.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            deps: None,
        }
    }

    /// Structured question with deps.
    pub fn with_deps(content: impl Into<String>, deps: Vec<Dep>) -> Self {
        Self {
            content: content.into(),
            deps: Some(deps),
        }
    }
}

impl From<&str> for Question {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

/// A cached answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer payload, or an object-store handle for non-string payloads.
    pub value: String,
    /// Payload kind.
    pub answer_type: AnswerType,
}

impl Answer {
    /// Plain-string answer.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            answer_type: AnswerType::Str,
        }
    }
}

/// One cache entry on its way into the scalar tier.
#[derive(Debug, Clone)]
pub struct CacheData {
    /// The question.
    pub question: Question,
    /// At least one answer.
    pub answers: Vec<Answer>,
    /// Embedding of the question text, if already computed.
    pub embedding: Option<Vec<f32>>,
}

impl CacheData {
    /// Single question/answer pair with its embedding.
    pub fn new(question: Question, answer: Answer, embedding: Vec<f32>) -> Self {
        Self {
            question,
            answers: vec![answer],
            embedding: Some(embedding),
        }
    }
}

/// A record read back from the scalar tier.
#[derive(Debug, Clone)]
pub struct ScalarRecord {
    /// Primary id.
    pub id: i64,
    /// The stored question.
    pub question: Question,
    /// Stored answers (the persisted row holds the first).
    pub answers: Vec<Answer>,
    /// Raw little-endian f32 embedding bytes.
    pub embedding_bytes: Vec<u8>,
    /// Normalized model scope the row belongs to.
    pub model: String,
}

/// Best-effort audit record of one handled request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogRecord {
    /// Response error code.
    pub error_code: i64,
    /// Response error description.
    pub error_desc: String,
    /// Whether the request produced a cache hit.
    pub cache_hit: bool,
    /// Normalized model scope.
    pub model: String,
    /// JSON form of the incoming query.
    pub query: String,
    /// Wall-clock seconds spent handling the request.
    pub delta_time: f64,
    /// Question text of the winning entry, if any.
    pub hit_query: String,
    /// Answer returned, if any.
    pub answer: String,
    /// When the request finished handling (queueing in the audit sink may
    /// delay the actual write).
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl QueryLogRecord {
    /// A non-hit record with zeroed timing, used for error and non-query paths.
    pub fn failure(error_code: i64, error_desc: impl Into<String>, model: &str) -> Self {
        Self {
            error_code,
            error_desc: error_desc.into(),
            cache_hit: false,
            model: model.to_string(),
            query: String::new(),
            delta_time: 0.0,
            hit_query: String::new(),
            answer: String::new(),
            created_at: chrono::Utc::now(),
        }
    }
}
