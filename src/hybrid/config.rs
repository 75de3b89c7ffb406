//! Configuration for hybrid score fusion.

use serde::{Deserialize, Serialize};

/// Weights for fusing ranking signals.
///
/// Weights are free-standing multipliers; they are not required to sum
/// to 1. Setting one weight to 1 and the rest to 0 reproduces that single
/// signal's ranking exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    /// Weight for the lexical (TF-IDF) similarity signal.
    pub lexical_weight: f64,
    /// Weight for the semantic (embedding) similarity signal.
    pub semantic_weight: f64,
    /// Weight for the optional classification-confidence signal.
    pub confidence_weight: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.5,
            semantic_weight: 0.5,
            confidence_weight: 0.3,
        }
    }
}
