//! End-to-end matching pipeline.
//!
//! [`MatchPipeline`] wires the stages together: normalize raw resumes and
//! job postings, fit one TF-IDF vocabulary epoch over the combined corpus,
//! rank resumes against each job, optionally fuse in semantic and
//! classifier-confidence signals, and train and evaluate the category
//! classifier. Every stage persists its artifacts through the pipeline's
//! [`ArtifactStore`] so a later run (or an external consumer) can reload
//! them.
//!
//! The pipeline is a batch service: components are constructed once and
//! shared by reference, stages run to completion in order, and all
//! cross-stage state flows through returned values rather than interior
//! mutability.

use std::sync::Arc;

use tracing::info;

use crate::analysis::TextNormalizer;
use crate::classify::{ClassifierTrainer, TrainerConfig, TrainingOutcome};
use crate::document::{Document, DocumentFailure, DocumentTable, RawDocument};
use crate::embedding::TextEncoder;
use crate::error::{Result, VitaeError};
use crate::evaluate::{EvaluationReport, Evaluator};
use crate::features::{FeatureMatrix, FeatureVector, TfIdfVectorizer};
use crate::hybrid::{HybridConfig, HybridScorer};
use crate::ranking::{RankedList, SimilarityRanker};
use crate::storage::{ArtifactStore, CorpusKind, RankingRecord};

/// Normalized corpora ready for feature extraction.
#[derive(Debug)]
pub struct PreparedCorpus {
    /// Normalized resumes, in input order.
    pub resumes: DocumentTable,
    /// Normalized job postings, in input order.
    pub jobs: DocumentTable,
    /// Documents dropped during normalization, across both corpora.
    pub failures: Vec<DocumentFailure>,
}

/// A fitted vocabulary epoch with both corpora transformed over it.
#[derive(Debug)]
pub struct FittedFeatures {
    /// The fitted vectorizer. Resumes and jobs share its single epoch so
    /// their vectors are comparable.
    pub vectorizer: TfIdfVectorizer,
    /// Resume rows, aligned with the resume table.
    pub resume_matrix: FeatureMatrix,
    /// Job rows, aligned with the job table.
    pub job_matrix: FeatureMatrix,
}

/// Classifier training output plus its held-out evaluation.
#[derive(Debug)]
pub struct TrainingReport {
    /// The training outcome, including the selected model.
    pub outcome: TrainingOutcome,
    /// Per-class evaluation of the selected model on the test split.
    pub report: EvaluationReport,
}

/// The end-to-end resume matching pipeline.
pub struct MatchPipeline {
    normalizer: TextNormalizer,
    ranker: SimilarityRanker,
    store: ArtifactStore,
    encoder: Option<Arc<dyn TextEncoder>>,
    hybrid: HybridConfig,
    trainer: TrainerConfig,
}

impl MatchPipeline {
    /// Create a pipeline persisting artifacts through the given store.
    pub fn new(store: ArtifactStore) -> Self {
        MatchPipeline {
            normalizer: TextNormalizer::new(),
            ranker: SimilarityRanker::new(),
            store,
            encoder: None,
            hybrid: HybridConfig::default(),
            trainer: TrainerConfig::default(),
        }
    }

    /// Attach a dense text encoder, enabling the semantic signal.
    pub fn with_encoder(mut self, encoder: Arc<dyn TextEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Override the hybrid fusion weights.
    pub fn with_hybrid_config(mut self, config: HybridConfig) -> Self {
        self.hybrid = config;
        self
    }

    /// Override the training configuration.
    pub fn with_trainer_config(mut self, config: TrainerConfig) -> Self {
        self.trainer = config;
        self
    }

    /// The pipeline's artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Normalize both corpora and persist the document tables.
    ///
    /// Individual documents that fail normalization are dropped and
    /// reported; the batch continues.
    pub fn prepare_corpus(
        &self,
        resumes: &[RawDocument],
        jobs: &[RawDocument],
    ) -> Result<PreparedCorpus> {
        let resume_batch = self.normalizer.normalize_batch(resumes);
        let job_batch = self.normalizer.normalize_batch(jobs);

        info!(
            resumes = resume_batch.table.len(),
            jobs = job_batch.table.len(),
            dropped = resume_batch.failures.len() + job_batch.failures.len(),
            "normalized corpora"
        );

        self.store
            .save_documents(CorpusKind::Resumes, &resume_batch.table)?;
        self.store.save_documents(CorpusKind::Jobs, &job_batch.table)?;

        let mut failures = resume_batch.failures;
        failures.extend(job_batch.failures);
        Ok(PreparedCorpus {
            resumes: resume_batch.table,
            jobs: job_batch.table,
            failures,
        })
    }

    /// Fit one vocabulary epoch over resumes and jobs combined, transform
    /// both corpora, and persist the epoch and matrices.
    ///
    /// Fitting on the union keeps both sides in the same vector space, so
    /// a resume row and a job row are directly comparable.
    pub fn fit_features(
        &self,
        resumes: &DocumentTable,
        jobs: &DocumentTable,
    ) -> Result<FittedFeatures> {
        let combined: Vec<Document> = resumes.iter().chain(jobs.iter()).cloned().collect();
        let combined = DocumentTable::new(combined);

        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&combined)?;

        let resume_matrix = vectorizer.transform_batch(resumes)?;
        let job_matrix = vectorizer.transform_batch(jobs)?;

        let epoch = vectorizer
            .epoch()
            .ok_or_else(|| VitaeError::not_fitted("vectorizer lost its epoch after fit"))?;
        self.store.save_vocabulary(epoch)?;
        self.store
            .save_features(CorpusKind::Resumes, &resume_matrix)?;
        self.store.save_features(CorpusKind::Jobs, &job_matrix)?;

        Ok(FittedFeatures {
            vectorizer,
            resume_matrix,
            job_matrix,
        })
    }

    /// Rank every resume against every job by lexical similarity and
    /// persist the full ranking table.
    pub fn rank_resumes(
        &self,
        resumes: &DocumentTable,
        jobs: &DocumentTable,
        features: &FittedFeatures,
    ) -> Result<Vec<RankingRecord>> {
        resumes.check_aligned(features.resume_matrix.len())?;
        jobs.check_aligned(features.job_matrix.len())?;

        let resume_ids = resumes.ids();
        let mut records = Vec::new();
        for (job_index, job) in jobs.iter().enumerate() {
            let job_row = features
                .job_matrix
                .row(job_index)
                .ok_or_else(|| VitaeError::row_alignment(jobs.len(), job_index))?;

            let ranked = self
                .ranker
                .rank(job_row, features.resume_matrix.rows(), &resume_ids)?;
            for entry in ranked.entries() {
                records.push(RankingRecord::new(
                    &job.id,
                    &entry.document_id,
                    entry.score,
                    entry.rank,
                ));
            }
        }

        info!(
            jobs = jobs.len(),
            resumes = resumes.len(),
            rows = records.len(),
            "ranked resumes against jobs"
        );
        self.store.save_rankings(&records)?;
        Ok(records)
    }

    /// Rank resumes against one job by fusing the lexical signal with the
    /// semantic signal and, when a model and target category are given,
    /// the classifier-confidence signal.
    ///
    /// Requires an attached encoder.
    pub fn hybrid_rank(
        &self,
        job: &Document,
        job_row: &FeatureVector,
        resumes: &DocumentTable,
        resume_matrix: &FeatureMatrix,
        confidence: Option<(&crate::classify::ClassificationModel, &str)>,
    ) -> Result<RankedList> {
        let encoder = self.encoder.as_ref().ok_or_else(|| {
            VitaeError::invalid_operation("hybrid ranking requires an attached text encoder")
        })?;
        resumes.check_aligned(resume_matrix.len())?;
        if resumes.is_empty() {
            return Ok(RankedList::empty());
        }

        let lexical = self.ranker.score(job_row, resume_matrix.rows())?;

        let resume_texts: Vec<String> = resumes.normalized_texts();
        let resume_refs: Vec<&str> = resume_texts.iter().map(String::as_str).collect();
        let job_embedding = encoder.encode(&job.normalized_text())?;
        let resume_embeddings = encoder.encode_batch(&resume_refs)?;
        let semantic = self.ranker.score(&job_embedding, &resume_embeddings)?;

        let scorer = HybridScorer::new(self.hybrid);
        let mut signals = vec![scorer.lexical(lexical), scorer.semantic(semantic)];
        if let Some((model, category)) = confidence {
            let scores = resume_matrix
                .rows()
                .iter()
                .map(|row| model.confidence_for(row, category))
                .collect::<Result<Vec<f64>>>()?;
            signals.push(scorer.confidence(scores));
        }

        scorer.rank(&signals, &resumes.ids())
    }

    /// Train the category classifier on labeled resume rows, evaluate the
    /// selected model on the held-out split, and persist both the model
    /// and its evaluation report.
    ///
    /// Nothing is persisted when training fails (for example on a
    /// degenerate label set).
    pub fn train_and_evaluate(
        &self,
        matrix: &FeatureMatrix,
        labels: &[String],
    ) -> Result<TrainingReport> {
        let trainer = ClassifierTrainer::new(self.trainer.clone());
        let outcome = trainer.train(matrix, labels)?;

        let (label_index, encoded) = crate::classify::LabelIndex::from_labels(labels);
        let test_rows: Vec<&FeatureVector> = outcome
            .test_indices
            .iter()
            .filter_map(|&index| matrix.row(index))
            .collect();
        let test_truth: Vec<usize> = outcome
            .test_indices
            .iter()
            .map(|&index| encoded[index])
            .collect();

        let report = Evaluator::evaluate(
            &outcome.model.classifier,
            &test_rows,
            &test_truth,
            label_index.classes(),
        )?;

        self.store.save_model(&outcome.model)?;
        self.store
            .save_report(outcome.model.metadata.algorithm, &report)?;
        info!(
            algorithm = %outcome.model.metadata.algorithm,
            test_accuracy = outcome.model.metadata.test_accuracy,
            "persisted classification model and report"
        );

        Ok(TrainingReport { outcome, report })
    }
}
