//! # Vitae
//!
//! A hybrid resume ranking and classification library for Rust.
//!
//! ## Features
//!
//! - Deterministic text normalization pipeline
//! - TF-IDF feature extraction over frozen vocabulary epochs
//! - Pluggable dense text encoders
//! - Cosine-similarity ranking with stable, dense ranks
//! - Weighted fusion of lexical, semantic, and confidence signals
//! - Cross-validated classifier selection with per-class evaluation reports

pub mod analysis;
pub mod classify;
pub mod document;
pub mod embedding;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod hybrid;
pub mod pipeline;
pub mod ranking;
pub mod storage;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
