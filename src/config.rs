//! Configuration management for training and serving
//!
//! Runtime configuration is loaded from a JSON file so dataset locations,
//! forest hyperparameters and the HTTP bind address can change without
//! recompiling. Framing constants and the label table are deliberately not
//! here: they live in `analysis::schema` and `analysis::decision`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::ForestOptions;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub dataset: DatasetConfig,
    pub training: TrainingConfig,
    pub server: ServerConfig,
}

/// Where the trained artifact lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("emotion_model.json"),
        }
    }
}

/// Labelled corpus layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Corpus root containing one folder per label
    pub root: PathBuf,
    /// Folder names in class-index order
    pub label_folders: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dataset"),
            label_folders: ["01Neutral", "02Fearful", "03Happy", "04Sad", "05Angry"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Split and forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for the report
    pub test_fraction: f64,
    /// Seed for both the split and the forest
    pub seed: u64,
    pub n_trees: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_depth: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            n_trees: 100,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_depth: None,
        }
    }
}

impl TrainingConfig {
    pub fn forest_options(&self) -> ForestOptions {
        ForestOptions {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            seed: self.seed,
            ..ForestOptions::default()
        }
    }
}

/// HTTP service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// `"*"` allows any origin
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Missing or malformed files fall back to defaults with a warning.
    /// Sections absent from the file take their default values.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn load() -> Self {
        Self::load_from_file("assets/emotion_config.json")
    }
}
