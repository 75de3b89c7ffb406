//! Similarity measures over feature and embedding vectors.

use crate::embedding::EmbeddingVector;
use crate::features::{EpochId, FeatureVector};

/// A vector that can participate in cosine-similarity ranking.
///
/// Implemented by sparse [`FeatureVector`]s and dense [`EmbeddingVector`]s;
/// scores are only defined between vectors of the same space and dimension.
pub trait SimilarityVector {
    /// Dimension of the vector space.
    fn dimension(&self) -> usize;

    /// Dot product with another vector of the same space.
    fn dot(&self, other: &Self) -> f64;

    /// Euclidean norm.
    fn norm(&self) -> f64;

    /// Vocabulary epoch of the vector space, for spaces that have one.
    ///
    /// Two vectors carrying different epochs are never comparable, even
    /// when their dimensions coincide.
    fn epoch(&self) -> Option<EpochId> {
        None
    }
}

impl SimilarityVector for FeatureVector {
    fn dimension(&self) -> usize {
        FeatureVector::dimension(self)
    }

    fn dot(&self, other: &Self) -> f64 {
        FeatureVector::dot(self, other)
    }

    fn norm(&self) -> f64 {
        FeatureVector::norm(self)
    }

    fn epoch(&self) -> Option<EpochId> {
        Some(FeatureVector::epoch(self))
    }
}

impl SimilarityVector for EmbeddingVector {
    fn dimension(&self) -> usize {
        EmbeddingVector::dimension(self)
    }

    fn dot(&self, other: &Self) -> f64 {
        EmbeddingVector::dot(self, other)
    }

    fn norm(&self) -> f64 {
        EmbeddingVector::norm(self)
    }
}

/// Cosine similarity of two vectors.
///
/// Zero-magnitude vectors yield 0.0 rather than dividing by zero. Callers
/// are responsible for checking dimensions first.
pub fn cosine_similarity<V: SimilarityVector>(a: &V, b: &V) -> f64 {
    let norm_a = a.norm();
    let norm_b = b.norm();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        a.dot(b) / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = EmbeddingVector::new(vec![0.3, 0.7, 0.2]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        let a = EmbeddingVector::new(vec![1.0, 0.0]);
        let b = EmbeddingVector::new(vec![0.0, 1.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_zero_vector_guard() {
        let a = EmbeddingVector::new(vec![0.0, 0.0]);
        let b = EmbeddingVector::new(vec![1.0, 1.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
