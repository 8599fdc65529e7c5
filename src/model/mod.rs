// Model module - the random forest classifier and everything that trains,
// evaluates and persists it.
//
// - tree: CART tree with Gini impurity
// - forest: bootstrap ensemble of trees, averaged leaf distributions
// - split: seeded train/test partition
// - metrics: confusion matrix and classification report
// - artifact: JSON model file with schema checks

pub mod artifact;
pub mod forest;
pub mod metrics;
pub mod split;
pub mod tree;

pub use artifact::{ModelArtifact, ARTIFACT_VERSION};
pub use forest::{ForestOptions, RandomForest};
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use split::{train_test_split, TrainTestSplit};

use crate::error::ModelError;

/// A trained model that maps a feature row to a class distribution.
///
/// Implementations are immutable after construction and shared across
/// threads by the inference service.
pub trait Classifier: Send + Sync {
    fn n_classes(&self) -> usize;

    fn feature_len(&self) -> usize;

    /// Exactly `n_classes()` probabilities summing to ~1.0.
    ///
    /// A row whose length differs from `feature_len()` is rejected with
    /// [`ModelError::FeatureLengthMismatch`].
    fn predict_probabilities(&self, features: &[f32]) -> Result<Vec<f32>, ModelError>;
}
