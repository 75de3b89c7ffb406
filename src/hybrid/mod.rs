//! Hybrid score fusion.
//!
//! Combines independently produced ranking signals (lexical TF-IDF
//! similarity, dense semantic similarity, optional classification
//! confidence) into one composite score per candidate, then re-ranks with
//! the same rule as [`crate::ranking`].

pub mod config;
pub mod scorer;

pub use config::HybridConfig;
pub use scorer::{HybridScorer, ScoreSignal, SignalSource};
