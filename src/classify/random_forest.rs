//! Random forest classifier.
//!
//! Bagged CART-style decision trees: each tree is grown on a bootstrap
//! sample of the training rows, each split considers a random subset of
//! roughly sqrt(dimension) features, and thresholds are midpoints between
//! observed feature values. Predictions average the leaf class
//! distributions across trees. Deterministic for a fixed seed.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::error::{Result, VitaeError};
use crate::features::FeatureVector;

/// A node in one decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: u32,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn distribution_for(&self, row: &FeatureVector) -> &[f64] {
        match self {
            TreeNode::Leaf { distribution } => distribution,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row.get(*feature) <= *threshold {
                    left.distribution_for(row)
                } else {
                    right.distribution_for(row)
                }
            }
        }
    }
}

/// Random forest over bagged decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    seed: u64,
    trees: Vec<TreeNode>,
    n_classes: usize,
    dimension: usize,
}

impl RandomForest {
    /// Create an untrained forest.
    pub fn new(n_trees: usize, max_depth: Option<usize>, min_samples_split: usize, seed: u64) -> Self {
        RandomForest {
            n_trees,
            max_depth,
            min_samples_split,
            seed,
            trees: Vec::new(),
            n_classes: 0,
            dimension: 0,
        }
    }

    /// Check if the model has been fit.
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

struct TreeBuilder<'a> {
    rows: &'a [&'a FeatureVector],
    labels: &'a [usize],
    n_classes: usize,
    features_per_split: usize,
    dimension: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
}

impl TreeBuilder<'_> {
    fn class_distribution(&self, samples: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &sample in samples {
            counts[self.labels[sample]] += 1.0;
        }
        let total = samples.len() as f64;
        for count in counts.iter_mut() {
            *count /= total;
        }
        counts
    }

    fn gini(&self, samples: &[usize]) -> f64 {
        let mut counts = vec![0usize; self.n_classes];
        for &sample in samples {
            counts[self.labels[sample]] += 1;
        }
        let total = samples.len() as f64;
        1.0 - counts
            .iter()
            .map(|&count| {
                let p = count as f64 / total;
                p * p
            })
            .sum::<f64>()
    }

    fn is_pure(&self, samples: &[usize]) -> bool {
        let first = self.labels[samples[0]];
        samples.iter().all(|&sample| self.labels[sample] == first)
    }

    /// Best (feature, threshold, weighted impurity) among a random feature
    /// subset. `None` when no split separates the samples.
    fn best_split(&self, samples: &[usize], rng: &mut StdRng) -> Option<(u32, f64)> {
        let candidates = sample(rng, self.dimension, self.features_per_split);

        let mut best: Option<(u32, f64, f64)> = None;
        for feature in candidates {
            let feature = feature as u32;
            let mut values: Vec<f64> = samples
                .iter()
                .map(|&sample| self.rows[sample].get(feature))
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();
            if values.len() < 2 {
                continue;
            }

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (left, right): (Vec<usize>, Vec<usize>) = samples
                    .iter()
                    .copied()
                    .partition(|&sample| self.rows[sample].get(feature) <= threshold);
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let total = samples.len() as f64;
                let impurity = (left.len() as f64 / total) * self.gini(&left)
                    + (right.len() as f64 / total) * self.gini(&right);
                if best.is_none_or(|(_, _, current)| impurity < current) {
                    best = Some((feature, threshold, impurity));
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    fn grow(&self, samples: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let at_depth_cap = self.max_depth.is_some_and(|cap| depth >= cap);
        if at_depth_cap
            || samples.len() < self.min_samples_split
            || self.is_pure(samples)
        {
            return TreeNode::Leaf {
                distribution: self.class_distribution(samples),
            };
        }

        let Some((feature, threshold)) = self.best_split(samples, rng) else {
            return TreeNode::Leaf {
                distribution: self.class_distribution(samples),
            };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .copied()
            .partition(|&sample| self.rows[sample].get(feature) <= threshold);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.grow(&left, depth + 1, rng)),
            right: Box::new(self.grow(&right, depth + 1, rng)),
        }
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, rows: &[&FeatureVector], labels: &[usize], n_classes: usize) -> Result<()> {
        if rows.is_empty() {
            return Err(VitaeError::invalid_operation(
                "cannot fit random forest on an empty training set",
            ));
        }
        let dimension = rows[0].dimension();
        let features_per_split = ((dimension as f64).sqrt().ceil() as usize)
            .clamp(1, dimension);

        let builder = TreeBuilder {
            rows,
            labels,
            n_classes,
            features_per_split,
            dimension,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split.max(2),
        };

        self.trees = (0..self.n_trees)
            .map(|tree| {
                // Offset seeds keep trees decorrelated but reproducible.
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(tree as u64));
                let bootstrap: Vec<usize> = (0..rows.len())
                    .map(|_| rng.random_range(0..rows.len()))
                    .collect();
                builder.grow(&bootstrap, 0, &mut rng)
            })
            .collect();

        self.n_classes = n_classes;
        self.dimension = dimension;
        Ok(())
    }

    fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(VitaeError::not_fitted("random forest predict before fit"));
        }

        let mut averaged = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (total, value) in averaged.iter_mut().zip(tree.distribution_for(row)) {
                *total += value;
            }
        }
        let count = self.trees.len() as f64;
        for value in averaged.iter_mut() {
            *value /= count;
        }
        Ok(averaged)
    }
}
