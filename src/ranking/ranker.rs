//! Similarity ranking.
//!
//! [`SimilarityRanker::rank`] scores a query vector against each candidate
//! with cosine similarity and produces a [`RankedList`]: scores sorted
//! descending, ties broken by original candidate index, ranks a dense
//! permutation of `1..=N`.

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::error::{Result, VitaeError};
use crate::ranking::similarity::{SimilarityVector, cosine_similarity};

/// One ranked candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Candidate document id.
    pub document_id: DocumentId,
    /// Similarity (or fused) score.
    pub score: f64,
    /// Dense rank, starting at 1.
    pub rank: usize,
}

/// An ordered ranking of candidates for one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedList {
    entries: Vec<RankedEntry>,
}

impl RankedList {
    /// Create an empty ranking.
    pub fn empty() -> Self {
        RankedList {
            entries: Vec::new(),
        }
    }

    /// Number of ranked candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ranking is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in rank order (best first).
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    /// The top-ranked entry, if any.
    pub fn best(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    /// Position of a document in the ranking, if present.
    pub fn rank_of(&self, id: &DocumentId) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| &entry.document_id == id)
            .map(|entry| entry.rank)
    }
}

/// Turn per-candidate scores into a [`RankedList`].
///
/// Descending stable sort: equal scores keep their original candidate
/// order. Shared by similarity ranking and hybrid fusion so both produce
/// identical rank semantics.
pub fn assign_ranks(scores: &[f64], ids: &[DocumentId]) -> Result<RankedList> {
    if scores.len() != ids.len() {
        return Err(VitaeError::row_alignment(ids.len(), scores.len()));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // sort_by is stable, so ties keep the original candidate index order.
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let entries = order
        .into_iter()
        .enumerate()
        .map(|(position, index)| RankedEntry {
            document_id: ids[index].clone(),
            score: scores[index],
            rank: position + 1,
        })
        .collect();

    Ok(RankedList { entries })
}

/// Cosine-similarity ranker over one vector space.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityRanker;

impl SimilarityRanker {
    /// Create a new ranker.
    pub fn new() -> Self {
        SimilarityRanker
    }

    /// Score candidates against a query without ranking.
    ///
    /// Every candidate must share the query's dimension; a mismatch fails
    /// with [`VitaeError::DimensionMismatch`] naming both dimensions, never
    /// silent truncation. Vectors carrying vocabulary epochs must also
    /// share the query's epoch, even when dimensions coincide.
    pub fn score<V: SimilarityVector>(&self, query: &V, candidates: &[V]) -> Result<Vec<f64>> {
        let expected = query.dimension();
        for candidate in candidates {
            if candidate.dimension() != expected {
                return Err(VitaeError::dimension_mismatch(
                    expected,
                    candidate.dimension(),
                ));
            }
            if let (Some(query_epoch), Some(candidate_epoch)) = (query.epoch(), candidate.epoch()) {
                if query_epoch != candidate_epoch {
                    return Err(VitaeError::invalid_operation(format!(
                        "cannot score vectors from different vocabulary epochs: {query_epoch} vs {candidate_epoch}"
                    )));
                }
            }
        }

        Ok(candidates
            .iter()
            .map(|candidate| cosine_similarity(query, candidate))
            .collect())
    }

    /// Rank candidates against a query.
    ///
    /// `ids` must be row-aligned with `candidates`. An empty candidate set
    /// yields an empty ranking, not an error.
    pub fn rank<V: SimilarityVector>(
        &self,
        query: &V,
        candidates: &[V],
        ids: &[DocumentId],
    ) -> Result<RankedList> {
        if candidates.len() != ids.len() {
            return Err(VitaeError::row_alignment(ids.len(), candidates.len()));
        }
        if candidates.is_empty() {
            return Ok(RankedList::empty());
        }

        let scores = self.score(query, candidates)?;
        assign_ranks(&scores, ids)
    }
}
