//! Cosine-similarity ranking over one vector space.

pub mod ranker;
pub mod similarity;

pub use ranker::{RankedEntry, RankedList, SimilarityRanker, assign_ranks};
pub use similarity::{SimilarityVector, cosine_similarity};
