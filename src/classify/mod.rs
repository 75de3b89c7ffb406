//! Supervised classification of resumes into job categories.
//!
//! The trainable algorithm set is a closed collection of tagged variants
//! behind one capability interface ([`Classifier`]): a generative model for
//! count/frequency features (multinomial naive Bayes), a margin-based
//! linear classifier (one-vs-rest hinge-loss SVM), and a tree ensemble
//! (random forest). [`trainer::ClassifierTrainer`] tunes each family by
//! cross-validated grid search and selects the primary model on a held-out
//! test split.

pub mod linear_svm;
pub mod naive_bayes;
pub mod random_forest;
pub mod trainer;

pub use linear_svm::LinearSvm;
pub use naive_bayes::MultinomialNaiveBayes;
pub use random_forest::RandomForest;
pub use trainer::{CandidateReport, ClassifierTrainer, TrainerConfig, TrainingOutcome};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VitaeError};
use crate::features::{EpochId, FeatureVector};

/// Capability interface shared by all trainable algorithm families.
pub trait Classifier {
    /// Train on feature rows and class indices.
    fn fit(&mut self, rows: &[&FeatureVector], labels: &[usize], n_classes: usize) -> Result<()>;

    /// Per-class probability estimates for one row.
    fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>>;

    /// Predicted class index for one row.
    fn predict(&self, row: &FeatureVector) -> Result<usize> {
        let proba = self.predict_proba(row)?;
        Ok(argmax(&proba))
    }
}

/// Index of the largest value (first on ties).
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = index;
        }
    }
    best
}

/// The algorithm families the trainer considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// Multinomial naive Bayes.
    NaiveBayes,
    /// One-vs-rest linear SVM.
    LinearSvm,
    /// Random forest.
    RandomForest,
}

impl AlgorithmKind {
    /// Stable identifier used in metadata and report file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::NaiveBayes => "naive_bayes",
            AlgorithmKind::LinearSvm => "linear_svm",
            AlgorithmKind::RandomForest => "random_forest",
        }
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hyperparameters for one candidate configuration, tagged by family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HyperParams {
    /// Naive Bayes smoothing.
    NaiveBayes {
        /// Laplace smoothing strength.
        alpha: f64,
    },
    /// Linear SVM regularization and schedule.
    LinearSvm {
        /// L2 regularization strength.
        lambda: f64,
        /// SGD passes over the training split.
        epochs: usize,
    },
    /// Random forest shape.
    RandomForest {
        /// Number of trees.
        n_trees: usize,
        /// Depth cap (`None` = unbounded).
        max_depth: Option<usize>,
        /// Minimum samples required to split a node.
        min_samples_split: usize,
    },
}

impl HyperParams {
    /// The family this configuration belongs to.
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            HyperParams::NaiveBayes { .. } => AlgorithmKind::NaiveBayes,
            HyperParams::LinearSvm { .. } => AlgorithmKind::LinearSvm,
            HyperParams::RandomForest { .. } => AlgorithmKind::RandomForest,
        }
    }

    /// Build an untrained classifier for this configuration.
    pub fn build(&self, seed: u64) -> TrainedClassifier {
        match *self {
            HyperParams::NaiveBayes { alpha } => {
                TrainedClassifier::NaiveBayes(MultinomialNaiveBayes::new(alpha))
            }
            HyperParams::LinearSvm { lambda, epochs } => {
                TrainedClassifier::LinearSvm(LinearSvm::new(lambda, epochs, seed))
            }
            HyperParams::RandomForest {
                n_trees,
                max_depth,
                min_samples_split,
            } => TrainedClassifier::RandomForest(RandomForest::new(
                n_trees,
                max_depth,
                min_samples_split,
                seed,
            )),
        }
    }
}

/// A trained estimator: closed tagged set, chosen at configuration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedClassifier {
    /// Multinomial naive Bayes.
    NaiveBayes(MultinomialNaiveBayes),
    /// One-vs-rest linear SVM.
    LinearSvm(LinearSvm),
    /// Random forest.
    RandomForest(RandomForest),
}

impl TrainedClassifier {
    /// The family of this estimator.
    pub fn algorithm(&self) -> AlgorithmKind {
        match self {
            TrainedClassifier::NaiveBayes(_) => AlgorithmKind::NaiveBayes,
            TrainedClassifier::LinearSvm(_) => AlgorithmKind::LinearSvm,
            TrainedClassifier::RandomForest(_) => AlgorithmKind::RandomForest,
        }
    }
}

impl Classifier for TrainedClassifier {
    fn fit(&mut self, rows: &[&FeatureVector], labels: &[usize], n_classes: usize) -> Result<()> {
        match self {
            TrainedClassifier::NaiveBayes(inner) => inner.fit(rows, labels, n_classes),
            TrainedClassifier::LinearSvm(inner) => inner.fit(rows, labels, n_classes),
            TrainedClassifier::RandomForest(inner) => inner.fit(rows, labels, n_classes),
        }
    }

    fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>> {
        match self {
            TrainedClassifier::NaiveBayes(inner) => inner.predict_proba(row),
            TrainedClassifier::LinearSvm(inner) => inner.predict_proba(row),
            TrainedClassifier::RandomForest(inner) => inner.predict_proba(row),
        }
    }

    fn predict(&self, row: &FeatureVector) -> Result<usize> {
        match self {
            TrainedClassifier::NaiveBayes(inner) => inner.predict(row),
            TrainedClassifier::LinearSvm(inner) => inner.predict(row),
            TrainedClassifier::RandomForest(inner) => inner.predict(row),
        }
    }
}

/// Mapping between label strings and class indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelIndex {
    classes: Vec<String>,
}

impl LabelIndex {
    /// Build an index from raw labels; returns the index and each label's
    /// class number. Classes are ordered alphabetically for determinism.
    pub fn from_labels(labels: &[String]) -> (LabelIndex, Vec<usize>) {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();

        let encoded = labels
            .iter()
            .map(|label| {
                classes
                    .binary_search(label)
                    .expect("every label is in the class list")
            })
            .collect();

        (LabelIndex { classes }, encoded)
    }

    /// Number of distinct classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if there are no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class name for an index.
    pub fn class_of(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// All class names in index order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Metadata recorded with a persisted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Winning algorithm family.
    pub algorithm: AlgorithmKind,
    /// Winning hyperparameter configuration.
    pub hyperparameters: HyperParams,
    /// Mean cross-validation accuracy of the winning configuration.
    pub cv_accuracy: f64,
    /// Held-out test accuracy that selected this model.
    pub test_accuracy: f64,
    /// Class names, in class-index order.
    pub classes: Vec<String>,
    /// Number of training examples (after any rebalancing).
    pub training_examples: usize,
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
}

/// The persisted primary classification model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationModel {
    /// The trained estimator.
    pub classifier: TrainedClassifier,
    /// The vocabulary epoch the model was fit against.
    pub epoch: EpochId,
    /// Selection and provenance metadata.
    pub metadata: ModelMetadata,
}

impl ClassificationModel {
    /// Predict the class name for a feature row.
    ///
    /// The row must come from the model's fitting epoch.
    pub fn predict_label(&self, row: &FeatureVector) -> Result<&str> {
        if row.epoch() != self.epoch {
            return Err(VitaeError::invalid_operation(format!(
                "feature vector epoch {} does not match model epoch {}",
                row.epoch(),
                self.epoch
            )));
        }
        let class = self.classifier.predict(row)?;
        self.metadata
            .classes
            .get(class)
            .map(String::as_str)
            .ok_or_else(|| {
                VitaeError::invalid_operation(format!("predicted unknown class index {class}"))
            })
    }

    /// Confidence that a row belongs to the given class.
    ///
    /// The row must come from the model's fitting epoch.
    pub fn confidence_for(&self, row: &FeatureVector, class_name: &str) -> Result<f64> {
        if row.epoch() != self.epoch {
            return Err(VitaeError::invalid_operation(format!(
                "feature vector epoch {} does not match model epoch {}",
                row.epoch(),
                self.epoch
            )));
        }
        let proba = self.classifier.predict_proba(row)?;
        let class = self
            .metadata
            .classes
            .iter()
            .position(|c| c == class_name)
            .ok_or_else(|| {
                VitaeError::invalid_operation(format!("unknown class name {class_name}"))
            })?;
        Ok(proba[class])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentId, DocumentTable};
    use crate::features::TfIdfVectorizer;

    fn fitted_vectorizer() -> TfIdfVectorizer {
        let table = DocumentTable::new(
            [("a", "rust backend"), ("b", "sales crm")]
                .iter()
                .map(|(id, text)| Document {
                    id: DocumentId::new(*id),
                    raw_text: text.to_string(),
                    normalized_tokens: text.split(' ').map(str::to_string).collect(),
                })
                .collect(),
        );
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&table).unwrap();
        vectorizer
    }

    fn fitted_model(vectorizer: &TfIdfVectorizer) -> ClassificationModel {
        let rows = vec![
            vectorizer.transform(&["rust".to_string()]).unwrap(),
            vectorizer.transform(&["sales".to_string()]).unwrap(),
        ];
        let row_refs: Vec<&FeatureVector> = rows.iter().collect();
        let mut classifier = TrainedClassifier::NaiveBayes(MultinomialNaiveBayes::new(1.0));
        classifier.fit(&row_refs, &[0, 1], 2).unwrap();

        ClassificationModel {
            classifier,
            epoch: vectorizer.epoch().unwrap().id(),
            metadata: ModelMetadata {
                algorithm: AlgorithmKind::NaiveBayes,
                hyperparameters: HyperParams::NaiveBayes { alpha: 1.0 },
                cv_accuracy: 1.0,
                test_accuracy: 1.0,
                classes: vec!["Engineering".to_string(), "Sales".to_string()],
                training_examples: 2,
                trained_at: chrono::Utc::now(),
            },
        }
    }

    #[test]
    fn test_predict_label_rejects_foreign_epoch() {
        let vectorizer = fitted_vectorizer();
        let model = fitted_model(&vectorizer);

        let other = fitted_vectorizer();
        let foreign = other.transform(&["rust".to_string()]).unwrap();
        assert!(matches!(
            model.predict_label(&foreign).unwrap_err(),
            VitaeError::InvalidOperation(_)
        ));
    }

    #[test]
    fn test_confidence_rejects_foreign_epoch() {
        let vectorizer = fitted_vectorizer();
        let model = fitted_model(&vectorizer);

        let native = vectorizer.transform(&["rust".to_string()]).unwrap();
        assert!(model.confidence_for(&native, "Engineering").unwrap() > 0.5);

        let other = fitted_vectorizer();
        let foreign = other.transform(&["rust".to_string()]).unwrap();
        assert!(matches!(
            model.confidence_for(&foreign, "Engineering").unwrap_err(),
            VitaeError::InvalidOperation(_)
        ));
    }

    #[test]
    fn test_label_index_is_alphabetical() {
        let labels: Vec<String> = ["Sales", "Engineering", "Sales", "Design"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (index, encoded) = LabelIndex::from_labels(&labels);

        assert_eq!(index.classes(), &["Design", "Engineering", "Sales"]);
        assert_eq!(encoded, vec![2, 1, 2, 0]);
    }

    #[test]
    fn test_argmax_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn test_hyperparams_kind() {
        assert_eq!(
            HyperParams::NaiveBayes { alpha: 1.0 }.kind(),
            AlgorithmKind::NaiveBayes
        );
        assert_eq!(
            HyperParams::RandomForest {
                n_trees: 10,
                max_depth: None,
                min_samples_split: 2
            }
            .kind(),
            AlgorithmKind::RandomForest
        );
    }
}
