//! Evaluation of trained classifiers on held-out data.
//!
//! Produces per-class precision, recall, F1, and support, plus overall
//! accuracy and macro/weighted averages. The report's `Display` output is
//! the familiar fixed-width table and is what gets persisted next to the
//! model artifact.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::error::{Result, VitaeError};
use crate::features::FeatureVector;

/// Metrics for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Of the rows predicted as this class, the fraction that were right.
    pub precision: f64,
    /// Of the rows truly in this class, the fraction that were found.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of true rows in this class.
    pub support: usize,
}

/// A full classification report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Class names paired with their metrics, in class-index order.
    pub per_class: Vec<(String, ClassMetrics)>,
    /// Overall fraction of correct predictions.
    pub accuracy: f64,
    /// Unweighted mean of the per-class metrics.
    pub macro_avg: ClassMetrics,
    /// Support-weighted mean of the per-class metrics.
    pub weighted_avg: ClassMetrics,
}

impl EvaluationReport {
    /// Build a report from parallel truth and prediction vectors.
    ///
    /// `classes` gives the display name for each class index; predictions
    /// and truths must index into it.
    pub fn from_predictions(
        truth: &[usize],
        predicted: &[usize],
        classes: &[String],
    ) -> Result<EvaluationReport> {
        if truth.len() != predicted.len() {
            return Err(VitaeError::row_alignment(truth.len(), predicted.len()));
        }
        if truth.is_empty() {
            return Err(VitaeError::invalid_operation(
                "cannot evaluate on an empty test set",
            ));
        }

        let n_classes = classes.len();
        let mut true_positive = vec![0usize; n_classes];
        let mut predicted_count = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];
        let mut correct = 0usize;

        for (&actual, &guess) in truth.iter().zip(predicted) {
            if actual >= n_classes || guess >= n_classes {
                return Err(VitaeError::invalid_operation(format!(
                    "class index out of range: actual {actual}, predicted {guess}, classes {n_classes}"
                )));
            }
            support[actual] += 1;
            predicted_count[guess] += 1;
            if actual == guess {
                true_positive[actual] += 1;
                correct += 1;
            }
        }

        let per_class: Vec<(String, ClassMetrics)> = classes
            .iter()
            .enumerate()
            .map(|(class, name)| {
                let precision = ratio(true_positive[class], predicted_count[class]);
                let recall = ratio(true_positive[class], support[class]);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                (
                    name.clone(),
                    ClassMetrics {
                        precision,
                        recall,
                        f1,
                        support: support[class],
                    },
                )
            })
            .collect();

        let total = truth.len();
        let macro_avg = average(&per_class, |_| 1.0, total);
        let weighted_avg = average(&per_class, |m| m.support as f64, total);

        Ok(EvaluationReport {
            per_class,
            accuracy: correct as f64 / total as f64,
            macro_avg,
            weighted_avg,
        })
    }

    /// Total number of evaluated rows.
    pub fn total_support(&self) -> usize {
        self.per_class.iter().map(|(_, m)| m.support).sum()
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn average(
    per_class: &[(String, ClassMetrics)],
    weight: impl Fn(&ClassMetrics) -> f64,
    total_support: usize,
) -> ClassMetrics {
    let total_weight: f64 = per_class.iter().map(|(_, m)| weight(m)).sum();
    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;
    if total_weight > 0.0 {
        for (_, metrics) in per_class {
            let w = weight(metrics) / total_weight;
            precision += w * metrics.precision;
            recall += w * metrics.recall;
            f1 += w * metrics.f1;
        }
    }
    ClassMetrics {
        precision,
        recall,
        f1,
        support: total_support,
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .per_class
            .iter()
            .map(|(name, _)| name.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>name_width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in &self.per_class {
            writeln!(
                f,
                "{name:>name_width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;

        let total = self.total_support();
        writeln!(
            f,
            "{:>name_width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, total
        )?;
        for (label, m) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            writeln!(
                f,
                "{label:>name_width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

/// Runs a classifier against held-out rows and builds the report.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Predict every row and compare against the true class indices.
    pub fn evaluate(
        classifier: &impl Classifier,
        rows: &[&FeatureVector],
        truth: &[usize],
        classes: &[String],
    ) -> Result<EvaluationReport> {
        if rows.len() != truth.len() {
            return Err(VitaeError::row_alignment(rows.len(), truth.len()));
        }
        let predicted = rows
            .iter()
            .map(|row| classifier.predict(row))
            .collect::<Result<Vec<usize>>>()?;
        EvaluationReport::from_predictions(truth, &predicted, classes)
    }
}
