//! Multinomial naive Bayes.
//!
//! Generative classifier suited to count and frequency features: class
//! priors plus per-feature log likelihoods with Laplace smoothing. TF-IDF
//! weights act as fractional counts, matching the multinomial model's use
//! with frequency-weighted text features.

use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::error::{Result, VitaeError};
use crate::features::FeatureVector;

/// Multinomial naive Bayes classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNaiveBayes {
    alpha: f64,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
    dimension: usize,
}

impl MultinomialNaiveBayes {
    /// Create an untrained model with Laplace smoothing `alpha`.
    pub fn new(alpha: f64) -> Self {
        MultinomialNaiveBayes {
            alpha,
            class_log_prior: Vec::new(),
            feature_log_prob: Vec::new(),
            dimension: 0,
        }
    }

    /// Check if the model has been fit.
    pub fn is_fitted(&self) -> bool {
        !self.class_log_prior.is_empty()
    }

    fn joint_log_likelihood(&self, row: &FeatureVector) -> Vec<f64> {
        (0..self.class_log_prior.len())
            .map(|class| {
                let mut log_likelihood = self.class_log_prior[class];
                for &(index, weight) in row.entries() {
                    log_likelihood += weight * self.feature_log_prob[class][index as usize];
                }
                log_likelihood
            })
            .collect()
    }
}

impl Classifier for MultinomialNaiveBayes {
    fn fit(&mut self, rows: &[&FeatureVector], labels: &[usize], n_classes: usize) -> Result<()> {
        if rows.is_empty() {
            return Err(VitaeError::invalid_operation(
                "cannot fit naive Bayes on an empty training set",
            ));
        }
        let dimension = rows[0].dimension();

        let mut class_counts = vec![0usize; n_classes];
        let mut feature_counts = vec![vec![0.0f64; dimension]; n_classes];
        for (row, &label) in rows.iter().zip(labels) {
            class_counts[label] += 1;
            for &(index, weight) in row.entries() {
                feature_counts[label][index as usize] += weight;
            }
        }

        let total = rows.len() as f64;
        self.class_log_prior = class_counts
            .iter()
            .map(|&count| ((count as f64).max(f64::MIN_POSITIVE) / total).ln())
            .collect();

        self.feature_log_prob = feature_counts
            .into_iter()
            .map(|counts| {
                let class_total: f64 = counts.iter().sum();
                let denominator = class_total + self.alpha * dimension as f64;
                counts
                    .into_iter()
                    .map(|count| ((count + self.alpha) / denominator).ln())
                    .collect()
            })
            .collect();

        self.dimension = dimension;
        Ok(())
    }

    fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(VitaeError::not_fitted("naive Bayes predict before fit"));
        }

        let joint = self.joint_log_likelihood(row);
        let max = joint.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = joint.iter().map(|&l| (l - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        Ok(exp.into_iter().map(|e| e / sum).collect())
    }

    fn predict(&self, row: &FeatureVector) -> Result<usize> {
        if !self.is_fitted() {
            return Err(VitaeError::not_fitted("naive Bayes predict before fit"));
        }
        Ok(crate::classify::argmax(&self.joint_log_likelihood(row)))
    }
}
