//! Sparse feature vectors and row-aligned feature matrices.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VitaeError};

/// Identifier of one vocabulary epoch.
///
/// An epoch is produced by exactly one fit operation; vectors tagged with
/// different epoch ids must never be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpochId(Uuid);

impl EpochId {
    /// Generate a fresh epoch id.
    pub fn generate() -> Self {
        EpochId(Uuid::new_v4())
    }
}

impl std::fmt::Display for EpochId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sparse term-weighted vector over a frozen vocabulary.
///
/// Entries are `(vocabulary index, weight)` pairs sorted by index; terms
/// absent from the document (or unseen by the vocabulary) have weight zero.
/// The dimension is always the vocabulary size of the producing epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    epoch: EpochId,
    dimension: usize,
    weights: Vec<(u32, f64)>,
}

impl FeatureVector {
    /// Create a feature vector from sorted `(index, weight)` entries.
    pub(crate) fn new(epoch: EpochId, dimension: usize, weights: Vec<(u32, f64)>) -> Self {
        debug_assert!(weights.windows(2).all(|w| w[0].0 < w[1].0));
        FeatureVector {
            epoch,
            dimension,
            weights,
        }
    }

    /// The epoch this vector was produced in.
    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    /// Vocabulary size of the producing epoch.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Non-zero entries, sorted by vocabulary index.
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.weights
    }

    /// Weight at a vocabulary index (zero when absent).
    pub fn get(&self, index: u32) -> f64 {
        match self.weights.binary_search_by_key(&index, |&(i, _)| i) {
            Ok(pos) => self.weights[pos].1,
            Err(_) => 0.0,
        }
    }

    /// Dot product with another vector from the same space.
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let mut sum = 0.0;
        let (mut a, mut b) = (0, 0);
        while a < self.weights.len() && b < other.weights.len() {
            let (ia, wa) = self.weights[a];
            let (ib, wb) = other.weights[b];
            match ia.cmp(&ib) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.weights
            .iter()
            .map(|&(_, w)| w * w)
            .sum::<f64>()
            .sqrt()
    }

    /// Materialize as a dense vector of length `dimension`.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dimension];
        for &(index, weight) in &self.weights {
            dense[index as usize] = weight;
        }
        dense
    }
}

/// A collection of feature vectors sharing one epoch, row-aligned to the
/// document table the rows were transformed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    epoch: EpochId,
    dimension: usize,
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    /// Create an empty matrix for an epoch.
    pub fn new(epoch: EpochId, dimension: usize) -> Self {
        FeatureMatrix {
            epoch,
            dimension,
            rows: Vec::new(),
        }
    }

    /// Append a row, rejecting vectors from a different space.
    pub fn push(&mut self, row: FeatureVector) -> Result<()> {
        if row.dimension() != self.dimension {
            return Err(VitaeError::dimension_mismatch(
                self.dimension,
                row.dimension(),
            ));
        }
        if row.epoch() != self.epoch {
            return Err(VitaeError::invalid_operation(format!(
                "cannot mix epochs in one feature matrix: {} vs {}",
                self.epoch,
                row.epoch()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// The epoch all rows share.
    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    /// Column count (vocabulary size).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get one row.
    pub fn row(&self, index: usize) -> Option<&FeatureVector> {
        self.rows.get(index)
    }

    /// All rows in order.
    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }
}
