//! Text analysis pipeline.
//!
//! This module turns raw document text into normalized token streams:
//! lowercasing, markup stripping, punctuation and digit removal, word
//! boundary tokenization, stop word filtering, and lemmatization to the
//! dictionary form of each token.

pub mod lemmatizer;
pub mod normalizer;
pub mod stopwords;

pub use lemmatizer::Lemmatizer;
pub use normalizer::{NormalizedBatch, TextNormalizer};
