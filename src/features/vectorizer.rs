//! TF-IDF vectorizer.
//!
//! `fit` builds a [`VocabularyEpoch`]: the top-K most document-frequent
//! terms of a corpus snapshot with smoothed inverse document frequencies.
//! `transform` maps token streams into [`FeatureVector`]s over the frozen
//! epoch. An instance moves from unfitted to fitted exactly once; a new
//! corpus snapshot requires a new instance, which produces a new epoch.
//!
//! # Examples
//!
//! ```
//! use vitae::analysis::TextNormalizer;
//! use vitae::document::{DocumentTable, RawDocument};
//! use vitae::features::TfIdfVectorizer;
//!
//! let normalizer = TextNormalizer::new();
//! let batch = normalizer.normalize_batch(&[
//!     RawDocument::new("r1", "rust engineer building services"),
//!     RawDocument::new("r2", "python data scientist"),
//! ]);
//!
//! let mut vectorizer = TfIdfVectorizer::new();
//! vectorizer.fit(&batch.table).unwrap();
//!
//! let vector = vectorizer.transform(&["rust".to_string()]).unwrap();
//! assert_eq!(vector.dimension(), vectorizer.vocabulary_size().unwrap());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::DocumentTable;
use crate::error::{Result, VitaeError};
use crate::features::vector::{EpochId, FeatureMatrix, FeatureVector};

/// Default cap on vocabulary size.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// An immutable term → index mapping with per-term IDF weights.
///
/// Produced by exactly one [`TfIdfVectorizer::fit`]; never mutated after
/// publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyEpoch {
    id: EpochId,
    terms: HashMap<String, u32>,
    idf: Vec<f64>,
    corpus_size: usize,
}

impl VocabularyEpoch {
    /// The epoch id.
    pub fn id(&self) -> EpochId {
        self.id
    }

    /// Vocabulary size (feature vector dimension).
    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    /// Number of documents the epoch was fit on.
    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }

    /// Index of a term, if in the vocabulary.
    pub fn index_of(&self, term: &str) -> Option<u32> {
        self.terms.get(term).copied()
    }
}

/// TF-IDF feature extractor.
///
/// Weight = term frequency (normalized by token count) × smoothed IDF
/// `ln((N + 1) / (df + 1)) + 1`.
#[derive(Debug)]
pub struct TfIdfVectorizer {
    max_features: usize,
    epoch: Option<VocabularyEpoch>,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer with the default vocabulary cap.
    pub fn new() -> Self {
        Self::with_max_features(DEFAULT_MAX_FEATURES)
    }

    /// Create an unfitted vectorizer with a custom vocabulary cap.
    pub fn with_max_features(max_features: usize) -> Self {
        TfIdfVectorizer {
            max_features,
            epoch: None,
        }
    }

    /// Reconstruct a fitted vectorizer from a persisted epoch.
    pub fn from_epoch(epoch: VocabularyEpoch) -> Self {
        TfIdfVectorizer {
            max_features: epoch.dimension(),
            epoch: Some(epoch),
        }
    }

    /// Fit the vocabulary on a corpus snapshot.
    ///
    /// Builds one new [`VocabularyEpoch`] capped at the `max_features` most
    /// document-frequent terms. Fitting an already-fitted instance is an
    /// error: re-fitting means a new epoch, which means a new instance.
    pub fn fit(&mut self, corpus: &DocumentTable) -> Result<&VocabularyEpoch> {
        if self.epoch.is_some() {
            return Err(VitaeError::invalid_operation(
                "vectorizer is already fitted; a new corpus snapshot requires a new instance",
            ));
        }

        let corpus_size = corpus.len();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for document in corpus.iter() {
            let mut seen: Vec<&str> = document
                .normalized_tokens
                .iter()
                .map(String::as_str)
                .collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // Keep the top-K terms by document frequency; break frequency ties
        // alphabetically so the epoch is deterministic.
        let mut ranked: Vec<(&str, usize)> = document_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        // Assign indices in alphabetical order over the retained terms.
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let mut terms = HashMap::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (index, (term, df)) in ranked.into_iter().enumerate() {
            terms.insert(term.to_string(), index as u32);
            idf.push(((corpus_size as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
        }

        let epoch = VocabularyEpoch {
            id: EpochId::generate(),
            terms,
            idf,
            corpus_size,
        };
        info!(
            epoch_id = %epoch.id(),
            vocabulary_size = epoch.dimension(),
            corpus_size,
            "fitted TF-IDF vocabulary epoch"
        );

        self.epoch = Some(epoch);
        Ok(self.epoch.as_ref().expect("epoch just set"))
    }

    /// Transform a token stream into a feature vector over the frozen epoch.
    ///
    /// Unseen terms get zero weight. Pure: never mutates the epoch.
    pub fn transform(&self, tokens: &[String]) -> Result<FeatureVector> {
        let epoch = self
            .epoch
            .as_ref()
            .ok_or_else(|| VitaeError::not_fitted("TfIdfVectorizer::transform before fit"))?;

        let mut counts: HashMap<u32, f64> = HashMap::new();
        for token in tokens {
            if let Some(index) = epoch.index_of(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let token_count = tokens.len() as f64;
        let mut weights: Vec<(u32, f64)> = counts
            .into_iter()
            .map(|(index, count)| {
                let tf = count / token_count;
                (index, tf * epoch.idf[index as usize])
            })
            .collect();
        weights.sort_unstable_by_key(|&(index, _)| index);

        Ok(FeatureVector::new(epoch.id(), epoch.dimension(), weights))
    }

    /// Transform a document table into a feature matrix row-aligned to it.
    pub fn transform_batch(&self, corpus: &DocumentTable) -> Result<FeatureMatrix> {
        let epoch = self
            .epoch
            .as_ref()
            .ok_or_else(|| VitaeError::not_fitted("TfIdfVectorizer::transform before fit"))?;

        let mut matrix = FeatureMatrix::new(epoch.id(), epoch.dimension());
        for document in corpus.iter() {
            matrix.push(self.transform(&document.normalized_tokens)?)?;
        }
        corpus.check_aligned(matrix.len())?;
        Ok(matrix)
    }

    /// The fitted epoch, if any.
    pub fn epoch(&self) -> Option<&VocabularyEpoch> {
        self.epoch.as_ref()
    }

    /// Vocabulary size of the fitted epoch.
    pub fn vocabulary_size(&self) -> Option<usize> {
        self.epoch.as_ref().map(|e| e.dimension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentId};

    fn table(docs: &[(&str, &[&str])]) -> DocumentTable {
        DocumentTable::new(
            docs.iter()
                .map(|(id, tokens)| Document {
                    id: DocumentId::new(*id),
                    raw_text: tokens.join(" "),
                    normalized_tokens: tokens.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let vectorizer = TfIdfVectorizer::new();
        let err = vectorizer.transform(&["rust".to_string()]).unwrap_err();
        assert!(matches!(err, VitaeError::NotFitted(_)));
    }

    #[test]
    fn test_refit_is_rejected() {
        let corpus = table(&[("a", &["rust", "engineer"]), ("b", &["python"])]);
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus).unwrap();

        let err = vectorizer.fit(&corpus).unwrap_err();
        assert!(matches!(err, VitaeError::InvalidOperation(_)));
    }

    #[test]
    fn test_dimension_is_vocabulary_size_for_any_input() {
        let corpus = table(&[
            ("a", &["rust", "engineer", "backend"]),
            ("b", &["python", "data", "engineer"]),
        ]);
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus).unwrap();
        let k = vectorizer.vocabulary_size().unwrap();
        assert_eq!(k, 5);

        for tokens in [
            vec!["rust".to_string()],
            vec!["completely".to_string(), "unseen".to_string()],
            vec![],
        ] {
            let vector = vectorizer.transform(&tokens).unwrap();
            assert_eq!(vector.dimension(), k);
        }
    }

    #[test]
    fn test_unseen_terms_zero_weight() {
        let corpus = table(&[("a", &["rust"]), ("b", &["python"])]);
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus).unwrap();

        let vector = vectorizer
            .transform(&["haskell".to_string(), "rust".to_string()])
            .unwrap();
        assert_eq!(vector.entries().len(), 1);
        assert!(vector.get(vectorizer.epoch().unwrap().index_of("rust").unwrap()) > 0.0);
    }

    #[test]
    fn test_max_features_cap() {
        let corpus = table(&[
            ("a", &["rust", "engineer", "backend", "tokio"]),
            ("b", &["rust", "python", "engineer"]),
            ("c", &["rust", "data"]),
        ]);
        let mut vectorizer = TfIdfVectorizer::with_max_features(2);
        vectorizer.fit(&corpus).unwrap();

        let epoch = vectorizer.epoch().unwrap();
        assert_eq!(epoch.dimension(), 2);
        // Highest document frequencies survive the cap.
        assert!(epoch.index_of("rust").is_some());
        assert!(epoch.index_of("engineer").is_some());
        assert!(epoch.index_of("tokio").is_none());
    }

    #[test]
    fn test_identical_tokens_identical_vectors() {
        let corpus = table(&[
            ("a", &["rust", "engineer"]),
            ("b", &["python", "developer"]),
        ]);
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus).unwrap();

        let tokens = vec!["rust".to_string(), "engineer".to_string()];
        assert_eq!(
            vectorizer.transform(&tokens).unwrap(),
            vectorizer.transform(&tokens).unwrap()
        );
    }

    #[test]
    fn test_batch_row_alignment() {
        let corpus = table(&[("a", &["rust"]), ("b", &["python"]), ("c", &["java"])]);
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus).unwrap();

        let matrix = vectorizer.transform_batch(&corpus).unwrap();
        assert_eq!(matrix.len(), corpus.len());
        assert_eq!(matrix.epoch(), vectorizer.epoch().unwrap().id());
    }
}
