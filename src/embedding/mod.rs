//! Text-to-vector pipeline.
//!
//! [`TextEmbedder`] is the model seam; [`EmbeddingDispatcher`] fans requests
//! out to a bounded worker pool. The in-tree [`HashEmbedder`] is
//! deterministic and model-free; real model loaders plug in through the same
//! trait.

pub mod dispatcher;
pub mod error;
pub mod hash;


pub use dispatcher::EmbeddingDispatcher;
pub use error::EmbeddingError;
pub use hash::HashEmbedder;

/// A loaded embedding model.
///
/// `embed` runs on a dedicated worker thread and may block.
pub trait TextEmbedder: Send {
    /// Embeds one text into a fixed-dimension f32 vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output dimension, constant for the embedder's lifetime.
    fn dimension(&self) -> usize;
}

/// Resolves an embedder implementation by name.
///
/// Concrete model loaders are out-of-tree; only the deterministic `hash`
/// embedder resolves here.
pub fn embedder_from_config(
    name: &str,
    dimension: usize,
) -> Result<Box<dyn TextEmbedder>, EmbeddingError> {
    match name {
        "hash" => Ok(Box::new(HashEmbedder::new(dimension)?)),
        other => Err(EmbeddingError::InvalidConfig {
            reason: format!("unsupported embedding model: {other}"),
        }),
    }
}
