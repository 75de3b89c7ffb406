//! Model training, tuning, and selection.
//!
//! [`ClassifierTrainer`] runs the full supervised workflow: a stratified
//! train/test split, optional oversampling of minority classes on the
//! training side only, cross-validated grid search over every candidate
//! configuration, and selection of the primary model by held-out test
//! accuracy. Grid cells evaluate in parallel across a worker pool.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{
    AlgorithmKind, ClassificationModel, Classifier, HyperParams, LabelIndex, ModelMetadata,
};
use crate::error::{Result, VitaeError};
use crate::features::{FeatureMatrix, FeatureVector};

/// Training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Fraction of examples held out for final model selection.
    pub test_fraction: f64,
    /// Requested number of cross-validation folds. The effective fold
    /// count is capped by the smallest training class.
    pub cv_folds: usize,
    /// Duplicate minority-class training examples up to the majority
    /// class size. Never applied to the test split.
    pub oversample: bool,
    /// Seed for splits, shuffles, and stochastic estimators.
    pub seed: u64,
    /// Candidate configurations to search.
    pub grid: Vec<HyperParams>,
}

impl TrainerConfig {
    /// The stock search grid covering all three algorithm families.
    pub fn default_grid() -> Vec<HyperParams> {
        let mut grid = Vec::new();
        for alpha in [0.1, 0.5, 1.0] {
            grid.push(HyperParams::NaiveBayes { alpha });
        }
        for lambda in [1e-4, 1e-2] {
            for epochs in [10, 30] {
                grid.push(HyperParams::LinearSvm { lambda, epochs });
            }
        }
        for n_trees in [100, 200] {
            for max_depth in [None, Some(10), Some(20)] {
                for min_samples_split in [2, 5] {
                    grid.push(HyperParams::RandomForest {
                        n_trees,
                        max_depth,
                        min_samples_split,
                    });
                }
            }
        }
        grid
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            cv_folds: 5,
            oversample: false,
            seed: 42,
            grid: Self::default_grid(),
        }
    }
}

/// Cross-validation result for one candidate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    /// The configuration evaluated.
    pub params: HyperParams,
    /// Mean accuracy across the folds.
    pub cv_accuracy: f64,
}

/// Everything the training workflow produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The selected primary model, refit on the full training split.
    pub model: ClassificationModel,
    /// Label-to-class mapping used during training.
    pub labels: LabelIndex,
    /// Cross-validation results for every grid candidate.
    pub candidates: Vec<CandidateReport>,
    /// Row indices of the held-out test split, for downstream evaluation.
    pub test_indices: Vec<usize>,
}

/// Trains, tunes, and selects classification models.
#[derive(Debug, Clone, Default)]
pub struct ClassifierTrainer {
    config: TrainerConfig,
}

impl ClassifierTrainer {
    /// Create a trainer with the given configuration.
    pub fn new(config: TrainerConfig) -> Self {
        ClassifierTrainer { config }
    }

    /// Run the full workflow against feature rows and their labels.
    pub fn train(&self, matrix: &FeatureMatrix, raw_labels: &[String]) -> Result<TrainingOutcome> {
        let rows = matrix.rows();
        if rows.len() != raw_labels.len() {
            return Err(VitaeError::row_alignment(rows.len(), raw_labels.len()));
        }
        if rows.is_empty() {
            return Err(VitaeError::invalid_operation(
                "cannot train on an empty feature matrix",
            ));
        }

        let (label_index, encoded) = LabelIndex::from_labels(raw_labels);
        if label_index.len() < 2 {
            return Err(VitaeError::DegenerateLabelSet {
                distinct: label_index.len(),
            });
        }
        let n_classes = label_index.len();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let (train_indices, test_indices) =
            stratified_split(&encoded, n_classes, self.config.test_fraction, &mut rng);

        // Folds are built from the raw training indices; oversampling is
        // applied inside each fold's training side, so duplicates of one
        // row never span a fold boundary.
        let folds = build_folds(&train_indices, &encoded, n_classes, self.config.cv_folds, &mut rng);
        let candidates = self.cross_validate(rows, &encoded, n_classes, &folds)?;

        let mut final_train = train_indices.clone();
        if self.config.oversample {
            oversample_minorities(&mut final_train, &encoded, n_classes);
        }

        info!(
            total = rows.len(),
            train = final_train.len(),
            test = test_indices.len(),
            classes = n_classes,
            "split corpus for training"
        );

        let (model, cv_accuracy, test_accuracy) = self.select_model(
            rows,
            &encoded,
            n_classes,
            &final_train,
            &test_indices,
            &candidates,
        )?;

        info!(
            algorithm = %model.algorithm(),
            cv_accuracy,
            test_accuracy,
            "selected primary model"
        );

        let metadata = ModelMetadata {
            algorithm: model.algorithm(),
            hyperparameters: best_of_family(&candidates, model.algorithm())
                .map(|c| c.params.clone())
                .ok_or_else(|| {
                    VitaeError::invalid_operation("selected model has no grid candidate")
                })?,
            cv_accuracy,
            test_accuracy,
            classes: label_index.classes().to_vec(),
            training_examples: final_train.len(),
            trained_at: Utc::now(),
        };

        Ok(TrainingOutcome {
            model: ClassificationModel {
                classifier: model,
                epoch: matrix.epoch(),
                metadata,
            },
            labels: label_index,
            candidates,
            test_indices,
        })
    }

    /// Evaluate every grid candidate across the folds, in parallel.
    fn cross_validate(
        &self,
        rows: &[FeatureVector],
        encoded: &[usize],
        n_classes: usize,
        folds: &[Vec<usize>],
    ) -> Result<Vec<CandidateReport>> {
        let cells: Vec<(usize, usize)> = (0..self.config.grid.len())
            .flat_map(|candidate| (0..folds.len()).map(move |fold| (candidate, fold)))
            .collect();

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_cpus::get())
            .build()
            .map_err(|e| VitaeError::invalid_operation(format!("worker pool: {e}")))?;

        let accuracies: Vec<Result<(usize, f64)>> = pool.install(|| {
            cells
                .par_iter()
                .map(|&(candidate, fold)| {
                    let held_out = &folds[fold];
                    let mut train: Vec<usize> = folds
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| *index != fold)
                        .flat_map(|(_, f)| f.iter().copied())
                        .collect();
                    if self.config.oversample {
                        oversample_minorities(&mut train, encoded, n_classes);
                    }

                    let mut model = self.config.grid[candidate].build(self.config.seed);
                    fit_on(&mut model, rows, encoded, &train, n_classes)?;
                    let accuracy = accuracy_on(&model, rows, encoded, held_out)?;
                    Ok((candidate, accuracy))
                })
                .collect()
        });

        let mut sums = vec![0.0; self.config.grid.len()];
        let mut counts = vec![0usize; self.config.grid.len()];
        for cell in accuracies {
            let (candidate, accuracy) = cell?;
            sums[candidate] += accuracy;
            counts[candidate] += 1;
        }

        Ok(self
            .config
            .grid
            .iter()
            .enumerate()
            .map(|(index, params)| CandidateReport {
                params: params.clone(),
                cv_accuracy: sums[index] / counts[index].max(1) as f64,
            })
            .collect())
    }

    /// Refit each family's best configuration on the full training split
    /// and pick the winner by test accuracy.
    fn select_model(
        &self,
        rows: &[FeatureVector],
        encoded: &[usize],
        n_classes: usize,
        train_indices: &[usize],
        test_indices: &[usize],
        candidates: &[CandidateReport],
    ) -> Result<(crate::classify::TrainedClassifier, f64, f64)> {
        let families = [
            AlgorithmKind::NaiveBayes,
            AlgorithmKind::LinearSvm,
            AlgorithmKind::RandomForest,
        ];

        let mut winner: Option<(crate::classify::TrainedClassifier, f64, f64)> = None;
        for family in families {
            let Some(best) = best_of_family(candidates, family) else {
                continue;
            };

            let mut model = best.params.build(self.config.seed);
            fit_on(&mut model, rows, encoded, train_indices, n_classes)?;
            let test_accuracy = accuracy_on(&model, rows, encoded, test_indices)?;
            info!(
                algorithm = %family,
                cv_accuracy = best.cv_accuracy,
                test_accuracy,
                "refit family finalist"
            );

            let better = winner
                .as_ref()
                .is_none_or(|(_, _, current)| test_accuracy > *current);
            if better {
                winner = Some((model, best.cv_accuracy, test_accuracy));
            }
        }

        winner.ok_or_else(|| VitaeError::invalid_operation("search grid is empty"))
    }
}

/// Best candidate of one family by mean cross-validation accuracy.
fn best_of_family(candidates: &[CandidateReport], family: AlgorithmKind) -> Option<&CandidateReport> {
    candidates
        .iter()
        .filter(|c| c.params.kind() == family)
        .max_by(|a, b| a.cv_accuracy.total_cmp(&b.cv_accuracy))
}

fn fit_on(
    model: &mut impl Classifier,
    rows: &[FeatureVector],
    encoded: &[usize],
    indices: &[usize],
    n_classes: usize,
) -> Result<()> {
    let subset_rows: Vec<&FeatureVector> = indices.iter().map(|&i| &rows[i]).collect();
    let subset_labels: Vec<usize> = indices.iter().map(|&i| encoded[i]).collect();
    model.fit(&subset_rows, &subset_labels, n_classes)
}

fn accuracy_on(
    model: &impl Classifier,
    rows: &[FeatureVector],
    encoded: &[usize],
    indices: &[usize],
) -> Result<f64> {
    if indices.is_empty() {
        return Ok(0.0);
    }
    let mut correct = 0usize;
    for &index in indices {
        if model.predict(&rows[index])? == encoded[index] {
            correct += 1;
        }
    }
    Ok(correct as f64 / indices.len() as f64)
}

/// Split row indices into train and test sets, preserving per-class
/// proportions. A class with a single example stays in the training split.
fn stratified_split(
    encoded: &[usize],
    n_classes: usize,
    test_fraction: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (index, &class) in encoded.iter().enumerate() {
        by_class[class].push(index);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for members in by_class.iter_mut() {
        members.shuffle(rng);
        let held_out = if members.len() < 2 {
            0
        } else {
            (((members.len() as f64) * test_fraction).round() as usize)
                .clamp(1, members.len() - 1)
        };
        test.extend_from_slice(&members[..held_out]);
        train.extend_from_slice(&members[held_out..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Duplicate minority-class training indices until every class matches the
/// largest one. Deterministic: duplicates cycle each class's members in
/// their existing order.
fn oversample_minorities(train: &mut Vec<usize>, encoded: &[usize], n_classes: usize) {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for &index in train.iter() {
        by_class[encoded[index]].push(index);
    }
    let target = by_class.iter().map(Vec::len).max().unwrap_or(0);

    for members in &by_class {
        if members.is_empty() {
            continue;
        }
        for extra in 0..target - members.len() {
            train.push(members[extra % members.len()]);
        }
    }
}

/// Stratified folds over the training indices. The effective fold count is
/// the requested count capped by the smallest class, floored at 2.
///
/// Assignment round-robins with one cursor across all classes, so even a
/// set of singleton classes fills every fold. Empty folds are dropped.
fn build_folds(
    train: &[usize],
    encoded: &[usize],
    n_classes: usize,
    requested: usize,
    rng: &mut StdRng,
) -> Vec<Vec<usize>> {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for &index in train {
        by_class[encoded[index]].push(index);
    }

    let smallest = by_class
        .iter()
        .filter(|members| !members.is_empty())
        .map(Vec::len)
        .min()
        .unwrap_or(0);
    let k = requested.min(smallest).max(2);

    let mut folds = vec![Vec::new(); k];
    let mut cursor = 0usize;
    for members in by_class.iter_mut() {
        members.shuffle(rng);
        for &index in members.iter() {
            folds[cursor % k].push(index);
            cursor += 1;
        }
    }
    folds.retain(|fold| !fold.is_empty());
    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentId, DocumentTable};
    use crate::features::TfIdfVectorizer;

    fn corpus(docs: &[(&str, &[&str])]) -> (TfIdfVectorizer, FeatureMatrix) {
        let table = DocumentTable::new(
            docs.iter()
                .map(|(id, tokens)| Document {
                    id: DocumentId::new(*id),
                    raw_text: tokens.join(" "),
                    normalized_tokens: tokens.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        );
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&table).unwrap();
        let matrix = vectorizer.transform_batch(&table).unwrap();
        (vectorizer, matrix)
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn small_config() -> TrainerConfig {
        TrainerConfig {
            test_fraction: 0.25,
            cv_folds: 2,
            oversample: false,
            seed: 42,
            grid: vec![
                HyperParams::NaiveBayes { alpha: 1.0 },
                HyperParams::LinearSvm {
                    lambda: 0.01,
                    epochs: 10,
                },
                HyperParams::RandomForest {
                    n_trees: 10,
                    max_depth: Some(5),
                    min_samples_split: 2,
                },
            ],
        }
    }

    fn engineering_vs_sales() -> (TfIdfVectorizer, FeatureMatrix, Vec<String>) {
        let (vectorizer, matrix) = corpus(&[
            ("r1", &["rust", "tokio", "backend"]),
            ("r2", &["rust", "async", "backend"]),
            ("r3", &["rust", "backend", "grpc"]),
            ("r4", &["rust", "tokio", "grpc"]),
            ("r5", &["sales", "quota", "crm"]),
            ("r6", &["sales", "pipeline", "crm"]),
            ("r7", &["sales", "crm", "territory"]),
            ("r8", &["sales", "quota", "territory"]),
        ]);
        let y = labels(&[
            "Engineering",
            "Engineering",
            "Engineering",
            "Engineering",
            "Sales",
            "Sales",
            "Sales",
            "Sales",
        ]);
        (vectorizer, matrix, y)
    }

    #[test]
    fn test_train_selects_a_model() {
        let (vectorizer, matrix, y) = engineering_vs_sales();
        let trainer = ClassifierTrainer::new(small_config());

        let outcome = trainer.train(&matrix, &y).unwrap();
        assert_eq!(outcome.model.epoch, matrix.epoch());
        assert_eq!(
            outcome.model.metadata.classes,
            vec!["Engineering".to_string(), "Sales".to_string()]
        );
        assert_eq!(outcome.candidates.len(), 3);
        assert!(!outcome.test_indices.is_empty());

        let engineer = vectorizer
            .transform(&["rust".to_string(), "backend".to_string()])
            .unwrap();
        assert_eq!(outcome.model.predict_label(&engineer).unwrap(), "Engineering");
    }

    #[test]
    fn test_single_class_rejected() {
        let (_, matrix) = corpus(&[
            ("a", &["rust", "backend"]),
            ("b", &["rust", "tokio"]),
            ("c", &["rust", "grpc"]),
        ]);
        let trainer = ClassifierTrainer::new(small_config());

        let err = trainer
            .train(&matrix, &labels(&["Engineering", "Engineering", "Engineering"]))
            .unwrap_err();
        assert!(matches!(err, VitaeError::DegenerateLabelSet { distinct: 1 }));
    }

    #[test]
    fn test_label_row_mismatch_rejected() {
        let (_, matrix) = corpus(&[("a", &["rust"]), ("b", &["sales"])]);
        let trainer = ClassifierTrainer::new(small_config());

        let err = trainer.train(&matrix, &labels(&["Engineering"])).unwrap_err();
        assert!(matches!(err, VitaeError::RowAlignment { .. }));
    }

    #[test]
    fn test_stratified_split_keeps_classes_apart() {
        let encoded = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let (train, test) = stratified_split(&encoded, 2, 0.2, &mut rng);

        assert_eq!(train.len() + test.len(), 10);
        // One of five examples per class held out.
        assert_eq!(test.len(), 2);
        let test_classes: Vec<usize> = test.iter().map(|&i| encoded[i]).collect();
        assert!(test_classes.contains(&0));
        assert!(test_classes.contains(&1));
    }

    #[test]
    fn test_oversample_balances_training_split() {
        let encoded = vec![0, 0, 0, 0, 0, 0, 1, 1];
        let mut train: Vec<usize> = (0..8).collect();
        oversample_minorities(&mut train, &encoded, 2);

        let minority = train.iter().filter(|&&i| encoded[i] == 1).count();
        let majority = train.iter().filter(|&&i| encoded[i] == 0).count();
        assert_eq!(minority, majority);
    }

    #[test]
    fn test_folds_never_contain_oversampled_duplicates() {
        // Folds are built before any oversampling, so across all folds each
        // training index appears exactly once.
        let encoded = vec![0, 0, 0, 0, 0, 0, 1, 1, 1];
        let train: Vec<usize> = (0..9).collect();
        let mut rng = StdRng::seed_from_u64(5);
        let folds = build_folds(&train, &encoded, 2, 3, &mut rng);

        let mut seen: Vec<usize> = folds.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, train);
    }

    #[test]
    fn test_singleton_classes_fill_every_fold() {
        let encoded = vec![0, 1];
        let train = vec![0, 1];
        let mut rng = StdRng::seed_from_u64(13);
        let folds = build_folds(&train, &encoded, 2, 5, &mut rng);

        assert_eq!(folds.len(), 2);
        assert!(folds.iter().all(|fold| !fold.is_empty()));
    }

    #[test]
    fn test_training_with_oversampling_balances_final_split() {
        let (_, matrix) = corpus(&[
            ("e1", &["rust", "tokio", "backend"]),
            ("e2", &["rust", "async", "backend"]),
            ("e3", &["rust", "backend", "grpc"]),
            ("e4", &["rust", "tokio", "grpc"]),
            ("e5", &["rust", "async", "grpc"]),
            ("e6", &["rust", "tokio", "async"]),
            ("s1", &["sales", "quota", "crm"]),
            ("s2", &["sales", "pipeline", "crm"]),
        ]);
        let y = labels(&[
            "Engineering",
            "Engineering",
            "Engineering",
            "Engineering",
            "Engineering",
            "Engineering",
            "Sales",
            "Sales",
        ]);

        let config = TrainerConfig {
            oversample: true,
            grid: vec![HyperParams::NaiveBayes { alpha: 1.0 }],
            ..small_config()
        };
        let trainer = ClassifierTrainer::new(config);
        let outcome = trainer.train(&matrix, &y).unwrap();

        // Engineering keeps 4 training rows after the split; Sales keeps 1
        // and is duplicated up to match, so 8 examples total.
        assert_eq!(outcome.model.metadata.training_examples, 8);
    }

    #[test]
    fn test_fold_count_capped_by_smallest_class() {
        let encoded = vec![0, 0, 0, 0, 0, 0, 1, 1, 1];
        let train: Vec<usize> = (0..9).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let folds = build_folds(&train, &encoded, 2, 5, &mut rng);

        assert_eq!(folds.len(), 3);
        let total: usize = folds.iter().map(Vec::len).sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn test_training_is_deterministic() {
        let (_, matrix, y) = engineering_vs_sales();
        let trainer = ClassifierTrainer::new(small_config());

        let first = trainer.train(&matrix, &y).unwrap();
        let second = trainer.train(&matrix, &y).unwrap();

        assert_eq!(first.test_indices, second.test_indices);
        assert_eq!(
            first.model.metadata.algorithm,
            second.model.metadata.algorithm
        );
        for (a, b) in first.candidates.iter().zip(&second.candidates) {
            assert_eq!(a.cv_accuracy, b.cv_accuracy);
        }
    }
}
