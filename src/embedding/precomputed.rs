//! Encoder for pre-computed embedding vectors.
//!
//! [`PrecomputedEncoder`] performs no model inference: it serves vectors
//! that were computed externally, keyed by the exact text they embed. Use
//! it when embeddings arrive with the corpus, or as a deterministic
//! stand-in for a neural encoder in tests and offline pipelines.

use std::collections::HashMap;

use crate::embedding::{EmbeddingVector, TextEncoder};
use crate::error::{Result, VitaeError};

/// An encoder that looks up externally computed vectors by text.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEncoder {
    dimension: usize,
    vectors: HashMap<String, EmbeddingVector>,
}

impl PrecomputedEncoder {
    /// Create an empty encoder producing vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        PrecomputedEncoder {
            dimension,
            vectors: HashMap::new(),
        }
    }

    /// Register the embedding for a text.
    pub fn insert<S: Into<String>>(&mut self, text: S, vector: EmbeddingVector) -> Result<()> {
        if vector.dimension() != self.dimension {
            return Err(VitaeError::dimension_mismatch(
                self.dimension,
                vector.dimension(),
            ));
        }
        self.vectors.insert(text.into(), vector);
        Ok(())
    }

    /// Number of registered vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if no vectors are registered.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl TextEncoder for PrecomputedEncoder {
    fn encode(&self, text: &str) -> Result<EmbeddingVector> {
        self.vectors.get(text).cloned().ok_or_else(|| {
            VitaeError::encoding(format!(
                "no precomputed vector registered for text of length {}",
                text.len()
            ))
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "precomputed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_roundtrip() {
        let mut encoder = PrecomputedEncoder::new(3);
        encoder
            .insert("rust engineer", EmbeddingVector::new(vec![1.0, 0.0, 0.0]))
            .unwrap();

        let vector = encoder.encode("rust engineer").unwrap();
        assert_eq!(vector.values(), &[1.0, 0.0, 0.0]);
        assert_eq!(encoder.dimension(), 3);
    }

    #[test]
    fn test_unknown_text_is_error() {
        let encoder = PrecomputedEncoder::new(3);
        assert!(encoder.encode("never registered").is_err());
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let mut encoder = PrecomputedEncoder::new(3);
        let err = encoder
            .insert("text", EmbeddingVector::new(vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, VitaeError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_batch_preserves_order() {
        let mut encoder = PrecomputedEncoder::new(1);
        encoder
            .insert("first", EmbeddingVector::new(vec![1.0]))
            .unwrap();
        encoder
            .insert("second", EmbeddingVector::new(vec![2.0]))
            .unwrap();

        let batch = encoder.encode_batch(&["second", "first"]).unwrap();
        assert_eq!(batch[0].values(), &[2.0]);
        assert_eq!(batch[1].values(), &[1.0]);
    }
}
