// Analysis module - feature schema, feature extraction and decision layer
//
// Architecture:
// - schema: single source of truth for the 58-value positional layout
// - features: waveform → FeatureVector (pure, no I/O)
// - decision: class distribution → PredictionResult
//
// Training and inference both go through these modules, so a vector built by
// the dataset loader and one built for an uploaded clip are laid out the same.

pub mod decision;
pub mod features;
pub mod schema;

pub use decision::{decide, EmotionLabel, LabelTable, PredictionResult};
pub use features::{FeatureExtractor, FeatureVector};
