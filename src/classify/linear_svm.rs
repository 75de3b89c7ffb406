//! Margin-based linear classifier.
//!
//! One-vs-rest linear SVM trained by stochastic gradient descent on the
//! hinge loss with L2 regularization (Pegasos-style updates). Deterministic
//! for a fixed seed.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::error::{Result, VitaeError};
use crate::features::FeatureVector;

const LEARNING_RATE: f64 = 0.1;

/// One-vs-rest linear SVM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    lambda: f64,
    epochs: usize,
    seed: u64,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    dimension: usize,
}

impl LinearSvm {
    /// Create an untrained model.
    pub fn new(lambda: f64, epochs: usize, seed: u64) -> Self {
        LinearSvm {
            lambda,
            epochs,
            seed,
            weights: Vec::new(),
            bias: Vec::new(),
            dimension: 0,
        }
    }

    /// Check if the model has been fit.
    pub fn is_fitted(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Signed distance to the separating hyperplane of one class.
    fn decision(&self, class: usize, row: &FeatureVector) -> f64 {
        let weights = &self.weights[class];
        let mut score = self.bias[class];
        for &(index, value) in row.entries() {
            score += weights[index as usize] * value;
        }
        score
    }

    fn decisions(&self, row: &FeatureVector) -> Vec<f64> {
        (0..self.weights.len())
            .map(|class| self.decision(class, row))
            .collect()
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, rows: &[&FeatureVector], labels: &[usize], n_classes: usize) -> Result<()> {
        if rows.is_empty() {
            return Err(VitaeError::invalid_operation(
                "cannot fit linear SVM on an empty training set",
            ));
        }
        let dimension = rows[0].dimension();
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.weights = vec![vec![0.0; dimension]; n_classes];
        self.bias = vec![0.0; n_classes];

        let mut order: Vec<usize> = (0..rows.len()).collect();
        for class in 0..n_classes {
            let weights = &mut self.weights[class];
            let bias = &mut self.bias[class];

            for _ in 0..self.epochs {
                order.shuffle(&mut rng);
                for &sample in &order {
                    let row = rows[sample];
                    let target = if labels[sample] == class { 1.0 } else { -1.0 };

                    let mut margin = *bias;
                    for &(index, value) in row.entries() {
                        margin += weights[index as usize] * value;
                    }

                    // L2 shrinkage on every step, hinge correction only
                    // inside the margin.
                    let shrink = 1.0 - LEARNING_RATE * self.lambda;
                    for weight in weights.iter_mut() {
                        *weight *= shrink;
                    }
                    if target * margin < 1.0 {
                        for &(index, value) in row.entries() {
                            weights[index as usize] += LEARNING_RATE * target * value;
                        }
                        *bias += LEARNING_RATE * target;
                    }
                }
            }
        }

        self.dimension = dimension;
        Ok(())
    }

    fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(VitaeError::not_fitted("linear SVM predict before fit"));
        }

        // Sigmoid-squashed decisions, normalized across classes.
        let squashed: Vec<f64> = self
            .decisions(row)
            .into_iter()
            .map(|d| 1.0 / (1.0 + (-d).exp()))
            .collect();
        let sum: f64 = squashed.iter().sum();
        if sum == 0.0 {
            let uniform = 1.0 / squashed.len() as f64;
            return Ok(vec![uniform; squashed.len()]);
        }
        Ok(squashed.into_iter().map(|s| s / sum).collect())
    }

    fn predict(&self, row: &FeatureVector) -> Result<usize> {
        if !self.is_fitted() {
            return Err(VitaeError::not_fitted("linear SVM predict before fit"));
        }
        Ok(crate::classify::argmax(&self.decisions(row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentId, DocumentTable};
    use crate::features::TfIdfVectorizer;

    fn fitted_vectorizer(docs: &[(&str, &[&str])]) -> (TfIdfVectorizer, Vec<FeatureVector>) {
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
        let rows = vectorizer.transform_batch(&table).unwrap().rows().to_vec();
        (vectorizer, rows)
    }

    #[test]
    fn test_separable_classes() {
        let (vectorizer, rows) = fitted_vectorizer(&[
            ("r1", &["rust", "tokio", "backend"]),
            ("r2", &["rust", "async", "backend"]),
            ("r3", &["sales", "quota", "crm"]),
            ("r4", &["sales", "pipeline", "crm"]),
        ]);
        let row_refs: Vec<&FeatureVector> = rows.iter().collect();

        let mut model = LinearSvm::new(0.0001, 30, 42);
        model.fit(&row_refs, &[0, 0, 1, 1], 2).unwrap();

        let engineer = vectorizer
            .transform(&["rust".to_string(), "tokio".to_string()])
            .unwrap();
        let seller = vectorizer
            .transform(&["sales".to_string(), "crm".to_string()])
            .unwrap();

        assert_eq!(model.predict(&engineer).unwrap(), 0);
        assert_eq!(model.predict(&seller).unwrap(), 1);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let (_, rows) = fitted_vectorizer(&[
            ("a", &["rust", "backend"]),
            ("b", &["sales", "crm"]),
            ("c", &["rust", "async"]),
            ("d", &["sales", "quota"]),
        ]);
        let row_refs: Vec<&FeatureVector> = rows.iter().collect();

        let mut first = LinearSvm::new(0.01, 10, 7);
        let mut second = LinearSvm::new(0.01, 10, 7);
        first.fit(&row_refs, &[0, 1, 0, 1], 2).unwrap();
        second.fit(&row_refs, &[0, 1, 0, 1], 2).unwrap();

        for row in &row_refs {
            assert_eq!(
                first.predict_proba(row).unwrap(),
                second.predict_proba(row).unwrap()
            );
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let (vectorizer, _) = fitted_vectorizer(&[("a", &["rust"]), ("b", &["sales"])]);
        let row = vectorizer.transform(&["rust".to_string()]).unwrap();

        let model = LinearSvm::new(0.01, 10, 42);
        assert!(matches!(
            model.predict(&row).unwrap_err(),
            VitaeError::NotFitted(_)
        ));
    }
}
