//! Deterministic hash-based embedder.
//!
//! Derives a pseudo-embedding from a seeded RNG keyed by the text's hash.
//! Identical text always produces the identical vector, which is exactly the
//! contract tests and stub deployments need; there is no semantic signal.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::TextEmbedder;
use super::error::EmbeddingError;

/// Text embedder producing deterministic pseudo-random unit-range vectors.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Creates an embedder with the given output dimension.
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "dimension must be non-zero".to_string(),
            });
        }
        Ok(Self { dimension })
    }
}

impl TextEmbedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        Ok((0..self.dimension)
            .map(|_| rng.random_range(-1.0f32..1.0f32))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
