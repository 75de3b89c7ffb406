//! Document model and row-aligned document tables.
//!
//! A [`Document`] is one resume or one job posting. A [`DocumentTable`] keeps
//! documents in a fixed order so that row *i* of any feature matrix built
//! from the table corresponds to document *i*. Operations that would break
//! that pairing fail with a row alignment error instead of silently
//! reordering.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitaeError};

/// Stable identifier for a document: a resume filename or a job id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Create a new document id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        DocumentId(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw input document as produced by an external extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// Stable document identifier.
    pub id: DocumentId,
    /// Extracted UTF-8 text.
    pub text: String,
}

impl RawDocument {
    /// Create a new raw document.
    pub fn new<S: Into<String>, T: Into<String>>(id: S, text: T) -> Self {
        RawDocument {
            id: DocumentId::new(id),
            text: text.into(),
        }
    }
}

/// A normalized document: one resume or job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identifier.
    pub id: DocumentId,
    /// Original extracted text.
    pub raw_text: String,
    /// Normalized token stream.
    pub normalized_tokens: Vec<String>,
}

impl Document {
    /// Normalized text as a single space-joined string.
    pub fn normalized_text(&self) -> String {
        self.normalized_tokens.join(" ")
    }
}

/// A single document that failed normalization and was dropped from a batch.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    /// Identifier of the failed document.
    pub id: DocumentId,
    /// Why the document was dropped.
    pub reason: String,
}

/// An ordered table of documents.
///
/// The order is the row order of every feature matrix derived from the
/// table; it never changes after construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentTable {
    documents: Vec<Document>,
}

impl DocumentTable {
    /// Create a table from documents in their final row order.
    pub fn new(documents: Vec<Document>) -> Self {
        DocumentTable { documents }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Get the document at a row.
    pub fn get(&self, row: usize) -> Option<&Document> {
        self.documents.get(row)
    }

    /// Iterate documents in row order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Document ids in row order.
    pub fn ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(|d| d.id.clone()).collect()
    }

    /// Normalized texts in row order.
    pub fn normalized_texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.normalized_text()).collect()
    }

    /// Verify that a paired collection has the same row count.
    pub fn check_aligned(&self, rows: usize) -> Result<()> {
        if self.documents.len() != rows {
            return Err(VitaeError::row_alignment(self.documents.len(), rows));
        }
        Ok(())
    }
}
