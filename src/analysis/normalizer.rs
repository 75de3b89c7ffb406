//! Text normalization.
//!
//! [`TextNormalizer`] is a pure text → tokens function: lowercase, strip
//! markup tags, strip punctuation and digits, tokenize on Unicode word
//! boundaries, drop stop words, lemmatize. Normalizing already-normalized
//! text is a no-op.
//!
//! # Examples
//!
//! ```
//! use vitae::analysis::TextNormalizer;
//!
//! let normalizer = TextNormalizer::new();
//! let tokens = normalizer.normalize("<b>Senior</b> Rust Engineers, 5 years!");
//!
//! assert_eq!(tokens, vec!["senior", "rust", "engineer", "year"]);
//! ```

use regex::Regex;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::lemmatizer::Lemmatizer;
use crate::analysis::stopwords::is_stop_word;
use crate::document::{Document, DocumentFailure, DocumentTable, RawDocument};

/// Result of normalizing a batch of raw documents.
///
/// Failed documents are dropped from the table and reported here; a single
/// malformed document never aborts the batch.
#[derive(Debug)]
pub struct NormalizedBatch {
    /// Successfully normalized documents, in input order.
    pub table: DocumentTable,
    /// Documents dropped from the batch, with reasons.
    pub failures: Vec<DocumentFailure>,
}

/// Deterministic raw text → normalized token stream transformer.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    markup: Regex,
    lemmatizer: Lemmatizer,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        TextNormalizer {
            // Anything that looks like an SGML/HTML tag.
            markup: Regex::new(r"<[^>]*>").expect("markup pattern is valid"),
            lemmatizer: Lemmatizer::new(),
        }
    }

    /// Normalize one text into its token stream.
    ///
    /// Empty input yields an empty token stream.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let stripped = self.markup.replace_all(&lowered, " ");

        // Replace punctuation and digits with spaces, keeping only letters.
        let cleaned: String = stripped
            .chars()
            .map(|c| if c.is_alphabetic() { c } else { ' ' })
            .collect();

        cleaned
            .unicode_words()
            .filter(|word| !is_stop_word(word))
            .map(|word| self.lemmatizer.lemmatize(word))
            .filter(|lemma| !lemma.is_empty() && !is_stop_word(lemma))
            .collect()
    }

    /// Normalize a batch of raw documents.
    ///
    /// Documents with blank source text (an upstream extraction failure)
    /// are logged and dropped; the batch continues.
    pub fn normalize_batch(&self, raw_documents: &[RawDocument]) -> NormalizedBatch {
        let mut documents = Vec::with_capacity(raw_documents.len());
        let mut failures = Vec::new();

        for raw in raw_documents {
            if raw.text.trim().is_empty() {
                warn!(document_id = %raw.id, "dropping document with blank source text");
                failures.push(DocumentFailure {
                    id: raw.id.clone(),
                    reason: "blank source text".to_string(),
                });
                continue;
            }

            documents.push(Document {
                id: raw.id.clone(),
                raw_text: raw.text.clone(),
                normalized_tokens: self.normalize(&raw.text),
            });
        }

        NormalizedBatch {
            table: DocumentTable::new(documents),
            failures,
        }
    }
}
