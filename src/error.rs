//! Error types for the Vitae library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`VitaeError`] enum. Stage-level failures (unfitted components, shape
//! violations, missing artifacts, degenerate training data) are fatal to the
//! current run and carry enough context to diagnose; per-document failures
//! are collected by the batch operations in [`crate::analysis`] and never
//! surface through this type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for Vitae operations.
#[derive(Error, Debug)]
pub enum VitaeError {
    /// I/O errors (artifact reads/writes).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A frozen-vocabulary or trained-model operation was attempted before fit.
    #[error("not fitted: {0}")]
    NotFitted(String),

    /// Vectors from different spaces or epochs were compared.
    #[error("dimension mismatch: query has {expected} dimensions, candidate has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A required persisted artifact is absent.
    #[error("missing artifact: {}", path.display())]
    MissingArtifact { path: PathBuf },

    /// Training was requested with fewer than two distinct labels.
    #[error("degenerate label set: found {distinct} distinct label(s), need at least 2")]
    DegenerateLabelSet { distinct: usize },

    /// A document table and its paired collection disagree on row count.
    #[error("row alignment violation: {left} rows on one side, {right} on the other")]
    RowAlignment { left: usize, right: usize },

    /// Text analysis errors (tokenization, normalization).
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Embedding encoder errors.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Invalid operation for the current component state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Binary serialization errors (feature matrices).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic anyhow error.
    #[error("error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`VitaeError`].
pub type Result<T> = std::result::Result<T, VitaeError>;

impl VitaeError {
    /// Create a new not-fitted error.
    pub fn not_fitted<S: Into<String>>(msg: S) -> Self {
        VitaeError::NotFitted(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        VitaeError::Analysis(msg.into())
    }

    /// Create a new encoding error.
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        VitaeError::Encoding(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        VitaeError::InvalidOperation(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        VitaeError::Serialization(msg.into())
    }

    /// Create a dimension mismatch error naming both dimensions.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        VitaeError::DimensionMismatch { expected, actual }
    }

    /// Create a row alignment error naming both row counts.
    pub fn row_alignment(left: usize, right: usize) -> Self {
        VitaeError::RowAlignment { left, right }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = VitaeError::not_fitted("transform called before fit");
        assert_eq!(
            error.to_string(),
            "not fitted: transform called before fit"
        );

        let error = VitaeError::dimension_mismatch(100, 50);
        assert_eq!(
            error.to_string(),
            "dimension mismatch: query has 100 dimensions, candidate has 50"
        );

        let error = VitaeError::DegenerateLabelSet { distinct: 1 };
        assert_eq!(
            error.to_string(),
            "degenerate label set: found 1 distinct label(s), need at least 2"
        );
    }

    #[test]
    fn test_missing_artifact_names_path() {
        let error = VitaeError::MissingArtifact {
            path: PathBuf::from("/models/vectorizer.json"),
        };
        assert!(error.to_string().contains("/models/vectorizer.json"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = VitaeError::from(io_error);

        match error {
            VitaeError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
