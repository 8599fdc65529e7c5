//! Bagged ensemble of CART trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeOptions};
use super::Classifier;
use crate::error::{ModelError, TrainingError};

/// Training hyperparameters for the forest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestOptions {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features inspected per split; `None` means `sqrt(feature_len)`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Random forest classifier producing a full class distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Number of `f32` values per input row.
    pub feature_len: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on row-major `x` with class indices `y`.
    pub fn fit(
        x: &[Vec<f32>],
        y: &[usize],
        n_classes: usize,
        options: &ForestOptions,
    ) -> Result<Self, TrainingError> {
        if x.len() != y.len() {
            return Err(TrainingError::MismatchedLengths {
                reason: format!("{} feature rows but {} labels", x.len(), y.len()),
            });
        }
        if x.is_empty() {
            return Err(TrainingError::EmptyDataset { samples: 0 });
        }
        let feature_len = x[0].len();
        if let Some(row) = x.iter().position(|row| row.len() != feature_len) {
            return Err(TrainingError::MismatchedLengths {
                reason: format!(
                    "row {} has {} values, expected {}",
                    row,
                    x[row].len(),
                    feature_len
                ),
            });
        }
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(TrainingError::MismatchedLengths {
                reason: format!("label {} outside {} classes", label, n_classes),
            });
        }

        let max_features = options
            .max_features
            .unwrap_or_else(|| (feature_len as f64).sqrt() as usize)
            .clamp(1, feature_len.max(1));
        let tree_options = TreeOptions {
            max_depth: options.max_depth,
            min_samples_split: options.min_samples_split,
            min_samples_leaf: options.min_samples_leaf,
            max_features,
        };

        tracing::info!(
            rows = x.len(),
            feature_len,
            n_classes,
            n_trees = options.n_trees,
            max_features,
            "Fitting random forest"
        );

        let n = x.len();
        let mut seeds = StdRng::seed_from_u64(options.seed);
        let mut trees = Vec::with_capacity(options.n_trees.max(1));
        for _ in 0..options.n_trees.max(1) {
            let mut rng = StdRng::seed_from_u64(seeds.gen());
            let samples: Vec<usize> = if options.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(DecisionTree::fit(
                x,
                y,
                samples,
                n_classes,
                &tree_options,
                &mut rng,
            ));
        }

        tracing::debug!(
            mean_nodes = trees.iter().map(|t| t.node_count()).sum::<usize>() / trees.len(),
            "Forest fitted"
        );

        Ok(Self {
            feature_len,
            n_classes,
            trees,
        })
    }

    /// Validate structural invariants (used after deserialization).
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_classes < 2 {
            return Err(ModelError::Invalid {
                reason: format!("forest must have at least 2 classes, found {}", self.n_classes),
            });
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid {
                reason: "forest has no trees".to_string(),
            });
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_classes, self.feature_len)
                .map_err(|reason| ModelError::Invalid {
                    reason: format!("tree {}: {}", index, reason),
                })?;
        }
        Ok(())
    }

    /// Most probable class index.
    pub fn predict(&self, features: &[f32]) -> Result<usize, ModelError> {
        let probabilities = self.predict_probabilities(features)?;
        Ok(crate::analysis::decision::argmax(&probabilities).unwrap_or(0))
    }
}

impl Classifier for RandomForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn feature_len(&self) -> usize {
        self.feature_len
    }

    /// Mean of the per-tree leaf distributions.
    fn predict_probabilities(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        if features.len() != self.feature_len {
            return Err(ModelError::FeatureLengthMismatch {
                expected: self.feature_len,
                found: features.len(),
            });
        }

        let mut sums = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (sum, &p) in sums.iter_mut().zip(tree.predict_distribution(features)) {
                *sum += p as f64;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        Ok(sums.into_iter().map(|s| (s / n_trees) as f32).collect())
    }
}
