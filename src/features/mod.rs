//! TF-IDF feature extraction over frozen vocabulary epochs.
//!
//! A [`TfIdfVectorizer`] is fit exactly once per corpus snapshot, producing
//! an immutable [`VocabularyEpoch`]. Feature vectors are only comparable
//! within the epoch that produced them.

pub mod vector;
pub mod vectorizer;

pub use vector::{EpochId, FeatureMatrix, FeatureVector};
pub use vectorizer::{TfIdfVectorizer, VocabularyEpoch};
