use super::error::VectorStoreError;

/// One (id, embedding) pair bound for the ANN index.
#[derive(Debug, Clone)]
pub struct VectorData {
    /// Scalar-tier primary id.
    pub id: i64,
    /// Embedding, float32, fixed dimension.
    pub data: Vec<f32>,
}

impl VectorData {
    /// Pairs a scalar id with its embedding.
    pub fn new(id: i64, data: Vec<f32>) -> Self {
        Self { id, data }
    }
}

/// One search candidate, ordered best-first by the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Raw distance in the store's metric (cosine: similarity, L2: squared
    /// euclidean).
    pub distance: f32,
    /// Scalar-tier primary id.
    pub id: i64,
}

/// Convert f32 values to little-endian bytes for BLOB storage.
pub fn f32_to_embedding_bytes(vector: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice::<f32, u8>(vector).to_vec()
}

/// Convert little-endian f32 bytes back to values.
pub fn embedding_bytes_to_f32(bytes: &[u8]) -> Result<Vec<f32>, VectorStoreError> {
    if !bytes.len().is_multiple_of(4) {
        return Err(VectorStoreError::InvalidEmbeddingBytesLength {
            actual: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
