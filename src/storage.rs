//! Persistence of pipeline artifacts.
//!
//! [`ArtifactStore`] reads and writes everything the pipeline produces
//! under one root directory: the fitted vocabulary and feature matrices,
//! the normalized document tables, the selected classification model, the
//! evaluation report, and the ranking scores table. Human-inspected
//! artifacts are JSON or plain text; feature matrices are binary for size.
//!
//! Loading an artifact that was never written fails with
//! [`VitaeError::MissingArtifact`] naming the absent path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{AlgorithmKind, ClassificationModel};
use crate::document::{DocumentId, DocumentTable};
use crate::error::{Result, VitaeError};
use crate::evaluate::EvaluationReport;
use crate::features::{FeatureMatrix, VocabularyEpoch};

const VECTORIZER_FILE: &str = "vectorizer.json";
const RESUMES_FILE: &str = "resumes.json";
const JOBS_FILE: &str = "jobs.json";
const RESUME_FEATURES_FILE: &str = "resume_features.bin";
const JOB_FEATURES_FILE: &str = "job_features.bin";
const MODEL_FILE: &str = "classification_model.json";
const RANKING_FILE: &str = "ranking_scores.csv";

/// Which document corpus an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusKind {
    /// Candidate resumes.
    Resumes,
    /// Job postings.
    Jobs,
}

impl CorpusKind {
    fn documents_file(&self) -> &'static str {
        match self {
            CorpusKind::Resumes => RESUMES_FILE,
            CorpusKind::Jobs => JOBS_FILE,
        }
    }

    fn features_file(&self) -> &'static str {
        match self {
            CorpusKind::Resumes => RESUME_FEATURES_FILE,
            CorpusKind::Jobs => JOB_FEATURES_FILE,
        }
    }
}

/// One row of the persisted ranking table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingRecord {
    /// The job the candidates were ranked against.
    pub job_id: String,
    /// The ranked resume.
    pub resume_id: String,
    /// Similarity (or fused) score.
    pub score: f64,
    /// Dense rank within this job's ranking, starting at 1.
    pub rank: usize,
}

impl RankingRecord {
    /// Build a record from ranking output.
    pub fn new(job_id: &DocumentId, resume_id: &DocumentId, score: f64, rank: usize) -> Self {
        RankingRecord {
            job_id: job_id.as_str().to_string(),
            resume_id: resume_id.as_str().to_string(),
            score,
            rank,
        }
    }
}

/// Filesystem store for pipeline artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at a directory. The directory is created on
    /// first write.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        ArtifactStore { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the fitted vocabulary epoch.
    pub fn save_vocabulary(&self, epoch: &VocabularyEpoch) -> Result<()> {
        self.write_json(VECTORIZER_FILE, epoch)
    }

    /// Load the persisted vocabulary epoch.
    pub fn load_vocabulary(&self) -> Result<VocabularyEpoch> {
        self.read_json(VECTORIZER_FILE)
    }

    /// Persist a normalized document table.
    pub fn save_documents(&self, corpus: CorpusKind, table: &DocumentTable) -> Result<()> {
        self.write_json(corpus.documents_file(), table)
    }

    /// Load a normalized document table.
    pub fn load_documents(&self, corpus: CorpusKind) -> Result<DocumentTable> {
        self.read_json(corpus.documents_file())
    }

    /// Persist a feature matrix in binary form.
    pub fn save_features(&self, corpus: CorpusKind, matrix: &FeatureMatrix) -> Result<()> {
        let bytes = bincode::serialize(matrix)
            .map_err(|e| VitaeError::serialization(format!("feature matrix encode: {e}")))?;
        self.write_bytes(corpus.features_file(), &bytes)
    }

    /// Load a persisted feature matrix.
    pub fn load_features(&self, corpus: CorpusKind) -> Result<FeatureMatrix> {
        let bytes = self.read_bytes(corpus.features_file())?;
        bincode::deserialize(&bytes)
            .map_err(|e| VitaeError::serialization(format!("feature matrix decode: {e}")))
    }

    /// Persist the selected classification model.
    pub fn save_model(&self, model: &ClassificationModel) -> Result<()> {
        self.write_json(MODEL_FILE, model)
    }

    /// Load the persisted classification model.
    pub fn load_model(&self) -> Result<ClassificationModel> {
        self.read_json(MODEL_FILE)
    }

    /// Persist an evaluation report as plain text, named after the
    /// algorithm it evaluates.
    pub fn save_report(&self, algorithm: AlgorithmKind, report: &EvaluationReport) -> Result<()> {
        let name = format!("{}_classification_report.txt", algorithm.as_str());
        self.ensure_root()?;
        let path = self.root.join(&name);
        fs::write(&path, report.to_string())?;
        info!(path = %path.display(), "wrote artifact");
        Ok(())
    }

    /// Path of an evaluation report for an algorithm.
    pub fn report_path(&self, algorithm: AlgorithmKind) -> PathBuf {
        self.root
            .join(format!("{}_classification_report.txt", algorithm.as_str()))
    }

    /// Persist ranking records as CSV.
    pub fn save_rankings(&self, records: &[RankingRecord]) -> Result<()> {
        self.ensure_root()?;
        let path = self.root.join(RANKING_FILE);
        let mut writer = csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = records.len(), "wrote artifact");
        Ok(())
    }

    /// Load the persisted ranking records.
    pub fn load_rankings(&self) -> Result<Vec<RankingRecord>> {
        let path = self.checked_path(RANKING_FILE)?;
        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn checked_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if !path.exists() {
            return Err(VitaeError::MissingArtifact { path });
        }
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.ensure_root()?;
        let path = self.root.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), "wrote artifact");
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T> {
        let path = self.checked_path(name)?;
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_root()?;
        let path = self.root.join(name);
        fs::write(&path, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
        Ok(())
    }

    fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.checked_path(name)?;
        Ok(fs::read(&path)?)
    }
}
