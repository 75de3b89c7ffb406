//! Weighted fusion of ranking signals.

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::error::{Result, VitaeError};
use crate::hybrid::config::HybridConfig;
use crate::ranking::ranker::{RankedList, assign_ranks};

/// Where a score vector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalSource {
    /// TF-IDF cosine similarity.
    Lexical,
    /// Dense embedding cosine similarity.
    Semantic,
    /// Classifier confidence for the target category.
    Confidence,
}

/// One ranking signal: per-candidate scores plus its fusion weight.
///
/// All signals fused together must score the same candidates in the same
/// order.
#[derive(Debug, Clone)]
pub struct ScoreSignal {
    /// Signal provenance.
    pub source: SignalSource,
    /// Fusion weight.
    pub weight: f64,
    /// Raw per-candidate scores, row-aligned with the candidate table.
    pub scores: Vec<f64>,
}

impl ScoreSignal {
    /// Create a signal with an explicit weight.
    pub fn new(source: SignalSource, weight: f64, scores: Vec<f64>) -> Self {
        ScoreSignal {
            source,
            weight,
            scores,
        }
    }
}

/// Fuses two or more ranking signals into one composite score per candidate.
#[derive(Debug, Clone, Default)]
pub struct HybridScorer {
    config: HybridConfig,
}

impl HybridScorer {
    /// Create a scorer with the given weights.
    pub fn new(config: HybridConfig) -> Self {
        HybridScorer { config }
    }

    /// The configured weights.
    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// A lexical signal carrying the configured lexical weight.
    pub fn lexical(&self, scores: Vec<f64>) -> ScoreSignal {
        ScoreSignal::new(SignalSource::Lexical, self.config.lexical_weight, scores)
    }

    /// A semantic signal carrying the configured semantic weight.
    pub fn semantic(&self, scores: Vec<f64>) -> ScoreSignal {
        ScoreSignal::new(SignalSource::Semantic, self.config.semantic_weight, scores)
    }

    /// A confidence signal carrying the configured confidence weight.
    pub fn confidence(&self, scores: Vec<f64>) -> ScoreSignal {
        ScoreSignal::new(
            SignalSource::Confidence,
            self.config.confidence_weight,
            scores,
        )
    }

    /// Fuse signals into one composite score per candidate.
    ///
    /// Each signal is min-max normalized to [0, 1] before weighting. A
    /// signal whose maximum is 0, or whose scores are all equal, skips
    /// normalization and contributes all zeros (there is no division by
    /// zero and no spurious ordering).
    pub fn fuse(&self, signals: &[ScoreSignal]) -> Result<Vec<f64>> {
        if signals.len() < 2 {
            return Err(VitaeError::invalid_operation(
                "hybrid fusion requires at least two signals",
            ));
        }

        let candidate_count = signals[0].scores.len();
        for signal in &signals[1..] {
            if signal.scores.len() != candidate_count {
                return Err(VitaeError::row_alignment(
                    candidate_count,
                    signal.scores.len(),
                ));
            }
        }

        let mut fused = vec![0.0; candidate_count];
        for signal in signals {
            let normalized = min_max_normalize(&signal.scores);
            for (total, value) in fused.iter_mut().zip(normalized) {
                *total += signal.weight * value;
            }
        }

        Ok(fused)
    }

    /// Fuse signals and re-rank the candidates.
    ///
    /// Uses the same descending sort, stable tie-break, and dense rank
    /// assignment as [`crate::ranking::SimilarityRanker`].
    pub fn rank(&self, signals: &[ScoreSignal], ids: &[DocumentId]) -> Result<RankedList> {
        let fused = self.fuse(signals)?;
        if fused.len() != ids.len() {
            return Err(VitaeError::row_alignment(ids.len(), fused.len()));
        }
        assign_ranks(&fused, ids)
    }
}

/// Min-max normalize scores to [0, 1].
///
/// Degenerate signals (max of exactly 0, or zero range) contribute all
/// zeros. Any signal with a nonzero range normalizes safely regardless of
/// sign; all-negative scores keep their ordering.
fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);

    if scores.is_empty() || max == 0.0 || max == min {
        return vec![0.0; scores.len()];
    }

    scores.iter().map(|&s| (s - min) / (max - min)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<DocumentId> {
        names.iter().map(|n| DocumentId::new(*n)).collect()
    }

    #[test]
    fn test_single_weight_reproduces_signal_ranking() {
        let scorer = HybridScorer::new(HybridConfig {
            lexical_weight: 1.0,
            semantic_weight: 0.0,
            confidence_weight: 0.0,
        });

        let lexical = vec![0.2, 0.9, 0.5];
        // Semantic signal disagrees completely and must not matter.
        let semantic = vec![0.9, 0.1, 0.8];
        let ids = ids(&["a", "b", "c"]);

        let ranked = scorer
            .rank(
                &[
                    scorer.lexical(lexical.clone()),
                    scorer.semantic(semantic),
                ],
                &ids,
            )
            .unwrap();

        let pure = assign_ranks(&lexical, &ids).unwrap();
        let fused_order: Vec<&str> = ranked
            .entries()
            .iter()
            .map(|e| e.document_id.as_str())
            .collect();
        let pure_order: Vec<&str> = pure
            .entries()
            .iter()
            .map(|e| e.document_id.as_str())
            .collect();
        assert_eq!(fused_order, pure_order);
    }

    #[test]
    fn test_all_negative_signal_preserves_its_ranking() {
        let scorer = HybridScorer::new(HybridConfig {
            lexical_weight: 0.0,
            semantic_weight: 1.0,
            confidence_weight: 0.0,
        });

        // Embedding cosine similarity can be negative for every candidate.
        let semantic = vec![-0.5, -0.2, -0.9];
        let lexical = vec![0.1, 0.1, 0.9];
        let ids = ids(&["a", "b", "c"]);

        let ranked = scorer
            .rank(
                &[scorer.lexical(lexical), scorer.semantic(semantic.clone())],
                &ids,
            )
            .unwrap();

        let fused_order: Vec<&str> = ranked
            .entries()
            .iter()
            .map(|e| e.document_id.as_str())
            .collect();
        let pure = assign_ranks(&semantic, &ids).unwrap();
        let pure_order: Vec<&str> = pure
            .entries()
            .iter()
            .map(|e| e.document_id.as_str())
            .collect();
        assert_eq!(fused_order, pure_order);
        assert_eq!(fused_order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_zero_max_signal_contributes_zeros() {
        let scorer = HybridScorer::new(HybridConfig::default());
        let dead = vec![0.0, 0.0, 0.0];
        let live = vec![0.3, 0.9, 0.6];

        let fused = scorer
            .fuse(&[scorer.lexical(dead), scorer.semantic(live.clone())])
            .unwrap();

        // Only the live signal contributes: 0.5 * min-max(live).
        assert_eq!(fused[0], 0.0);
        assert_eq!(fused[1], 0.5);
        assert!((fused[2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_equal_weights_blend() {
        let scorer = HybridScorer::new(HybridConfig::default());
        let lexical = vec![1.0, 0.0];
        let semantic = vec![0.0, 1.0];

        let fused = scorer
            .fuse(&[scorer.lexical(lexical), scorer.semantic(semantic)])
            .unwrap();
        assert_eq!(fused, vec![0.5, 0.5]);
    }

    #[test]
    fn test_confidence_signal_added() {
        let scorer = HybridScorer::new(HybridConfig::default());
        let lexical = vec![1.0, 0.5];
        let semantic = vec![1.0, 0.5];
        let confidence = vec![0.0, 1.0];

        let fused = scorer
            .fuse(&[
                scorer.lexical(lexical),
                scorer.semantic(semantic),
                scorer.confidence(confidence),
            ])
            .unwrap();

        // Weights do not need to sum to 1.
        assert_eq!(fused[0], 1.0);
        assert_eq!(fused[1], 0.3);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let scorer = HybridScorer::new(HybridConfig::default());
        let err = scorer
            .fuse(&[
                scorer.lexical(vec![1.0, 0.5]),
                scorer.semantic(vec![1.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, VitaeError::RowAlignment { .. }));
    }

    #[test]
    fn test_fewer_than_two_signals_rejected() {
        let scorer = HybridScorer::new(HybridConfig::default());
        let err = scorer.fuse(&[scorer.lexical(vec![1.0])]).unwrap_err();
        assert!(matches!(err, VitaeError::InvalidOperation(_)));
    }
}
