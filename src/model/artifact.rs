//! Persisted classifier artifact (JSON).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use crate::analysis::schema::{FEATURE_SCHEMA_VERSION, FEATURE_VECTOR_LEN};
use crate::error::ModelError;

/// Artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Trained forest plus the metadata needed to check it is compatible with
/// the running feature schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub artifact_version: u32,
    pub feature_schema_version: u32,
    /// Class names in class-index order.
    pub classes: Vec<String>,
    #[serde(flatten)]
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(forest: RandomForest, classes: Vec<String>) -> Self {
        Self {
            artifact_version: ARTIFACT_VERSION,
            feature_schema_version: FEATURE_SCHEMA_VERSION,
            classes,
            forest,
        }
    }

    /// Check versions, vector width, class count and tree structure.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.artifact_version != ARTIFACT_VERSION {
            return Err(ModelError::Invalid {
                reason: format!(
                    "unsupported artifact version {} (expected {})",
                    self.artifact_version, ARTIFACT_VERSION
                ),
            });
        }
        if self.feature_schema_version != FEATURE_SCHEMA_VERSION {
            return Err(ModelError::SchemaMismatch {
                expected: FEATURE_SCHEMA_VERSION,
                found: self.feature_schema_version,
            });
        }
        if self.forest.feature_len != FEATURE_VECTOR_LEN {
            return Err(ModelError::FeatureLengthMismatch {
                expected: FEATURE_VECTOR_LEN,
                found: self.forest.feature_len,
            });
        }
        if self.classes.len() != self.forest.n_classes {
            return Err(ModelError::ClassCountMismatch {
                expected: self.forest.n_classes,
                found: self.classes.len(),
            });
        }
        self.forest.validate()
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: Self = serde_json::from_slice(bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load and validate an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|err| ModelError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let artifact = Self::from_json_slice(&bytes)?;
        tracing::info!(
            path = %path.display(),
            trees = artifact.forest.trees.len(),
            classes = ?artifact.classes,
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_vec(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| ModelError::Io {
                path: parent.display().to_string(),
                reason: err.to_string(),
            })?;
        }
        std::fs::write(path, json).map_err(|err| ModelError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        tracing::info!(path = %path.display(), "Model artifact saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::forest::ForestOptions;

    fn artifact() -> ModelArtifact {
        let x: Vec<Vec<f32>> = (0..10)
            .map(|i| {
                let mut row = vec![0.0; FEATURE_VECTOR_LEN];
                row[0] = i as f32;
                row
            })
            .collect();
        let y: Vec<usize> = (0..10).map(|i| usize::from(i >= 5)).collect();
        let options = ForestOptions {
            n_trees: 3,
            max_features: Some(FEATURE_VECTOR_LEN),
            ..ForestOptions::default()
        };
        let forest = RandomForest::fit(&x, &y, 2, &options).unwrap();
        ModelArtifact::new(forest, vec!["low".to_string(), "high".to_string()])
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let original = artifact();
        original.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_json_layout() {
        let value = serde_json::to_value(artifact()).unwrap();
        for key in [
            "artifact_version",
            "feature_schema_version",
            "feature_len",
            "classes",
            "n_classes",
            "trees",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["feature_len"], FEATURE_VECTOR_LEN);
    }

    #[test]
    fn test_schema_version_mismatch() {
        let mut bad = artifact();
        bad.feature_schema_version = FEATURE_SCHEMA_VERSION + 1;
        assert!(matches!(bad.validate(), Err(ModelError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_feature_len_mismatch() {
        let mut bad = artifact();
        bad.forest.feature_len = 40;
        assert!(matches!(
            bad.validate(),
            Err(ModelError::FeatureLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_class_count_mismatch() {
        let mut bad = artifact();
        bad.classes.push("extra".to_string());
        assert!(matches!(
            bad.validate(),
            Err(ModelError::ClassCountMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ModelArtifact::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ModelError::Io { .. }));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, b"{not json").unwrap();
        assert!(matches!(
            ModelArtifact::load(&garbage).unwrap_err(),
            ModelError::Parse { .. }
        ));
    }
}
