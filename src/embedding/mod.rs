//! Dense semantic text encoders.
//!
//! [`TextEncoder`] wraps a pretrained dense encoder as an opaque oracle:
//! deterministic for identical input and order-preserving under batch
//! encoding. The encoder's internal architecture is not part of this
//! contract.

pub mod precomputed;

#[cfg(feature = "encoder-candle")]
pub mod candle;

pub use precomputed::PrecomputedEncoder;

#[cfg(feature = "encoder-candle")]
pub use candle::CandleTextEncoder;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A dense fixed-length embedding of one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    values: Vec<f64>,
}

impl EmbeddingVector {
    /// Create an embedding from raw values.
    pub fn new(values: Vec<f64>) -> Self {
        EmbeddingVector { values }
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Raw values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Dot product with another embedding.
    pub fn dot(&self, other: &EmbeddingVector) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Trait for converting text to dense embedding vectors.
///
/// Implementations must be deterministic: identical input text yields an
/// identical vector. Weight loading may happen once at first use; encoders
/// are otherwise stateless and reusable across batches.
pub trait TextEncoder: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn encode(&self, text: &str) -> Result<EmbeddingVector>;

    /// Generate embeddings for multiple texts, preserving input order.
    ///
    /// The default implementation calls [`TextEncoder::encode`] sequentially.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.encode(text)?);
        }
        Ok(results)
    }

    /// Dimension of generated embeddings.
    fn dimension(&self) -> usize;

    /// Name/identifier of this encoder, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_vector_math() {
        let a = EmbeddingVector::new(vec![3.0, 4.0]);
        let b = EmbeddingVector::new(vec![1.0, 0.0]);

        assert_eq!(a.dimension(), 2);
        assert_eq!(a.dot(&b), 3.0);
        assert!((a.norm() - 5.0).abs() < 1e-12);
    }
}
