//! Inference entrypoint.
//!
//! [`InferenceService`] is built once at startup from a validated model
//! artifact and then shared (behind an `Arc`) by every caller. The only
//! mutable state is a small per-sample-rate cache of feature extractors.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::analysis::features::FeatureExtractor;
use crate::analysis::{decide, LabelTable, PredictionResult};
use crate::audio::{DecoderChain, Waveform};
use crate::error::{log_audio_error, log_model_error, ModelError};
use crate::model::{Classifier, ModelArtifact};

/// Distinct sample rates whose extractors are kept; others are built per call.
const MAX_CACHED_EXTRACTORS: usize = 8;

/// The only error text callers ever see.
pub const INVALID_AUDIO_MESSAGE: &str =
    "Failed to process audio file. Please ensure it's a valid audio file.";

/// Result of one inference call
///
/// Serializes either as the prediction object or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Prediction(PredictionResult),
    Error { error: String },
}

impl InferenceResponse {
    pub fn invalid_audio() -> Self {
        InferenceResponse::Error {
            error: INVALID_AUDIO_MESSAGE.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, InferenceResponse::Error { .. })
    }
}

/// Read-only inference state: decoders, classifier and label table
pub struct InferenceService {
    decoders: DecoderChain,
    classifier: Arc<dyn Classifier>,
    labels: LabelTable,
    extractors: Mutex<HashMap<u32, Arc<FeatureExtractor>>>,
}

impl InferenceService {
    /// Wire a service from already-built parts
    ///
    /// Fails when the classifier's class count differs from the label table.
    pub fn new(
        decoders: DecoderChain,
        classifier: Arc<dyn Classifier>,
        labels: LabelTable,
    ) -> Result<Self, ModelError> {
        if classifier.n_classes() != labels.len() {
            return Err(ModelError::ClassCountMismatch {
                expected: labels.len(),
                found: classifier.n_classes(),
            });
        }
        Ok(Self {
            decoders,
            classifier,
            labels,
            extractors: Mutex::new(HashMap::new()),
        })
    }

    /// Build from a validated artifact; its classes must match `labels` in order.
    pub fn from_artifact(artifact: ModelArtifact, labels: LabelTable) -> Result<Self, ModelError> {
        let names = labels.names();
        if artifact.classes.len() != names.len() {
            return Err(ModelError::ClassCountMismatch {
                expected: names.len(),
                found: artifact.classes.len(),
            });
        }
        if artifact.classes.iter().zip(&names).any(|(a, b)| a != b) {
            return Err(ModelError::Invalid {
                reason: format!(
                    "artifact classes {:?} do not match labels {:?}",
                    artifact.classes, names
                ),
            });
        }
        Self::new(
            DecoderChain::default(),
            Arc::new(artifact.forest),
            labels,
        )
    }

    /// Load the artifact at `path` with the default label table.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let artifact = ModelArtifact::load(path).map_err(|err| {
            log_model_error(&err, "InferenceService::load");
            err
        })?;
        Self::from_artifact(artifact, LabelTable::default())
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn feature_len(&self) -> usize {
        self.classifier.feature_len()
    }

    /// Decode, extract, classify and decide
    ///
    /// Never fails: any problem becomes the fixed invalid-audio response and
    /// the details go to the log.
    pub fn predict_bytes(&self, bytes: &[u8]) -> InferenceResponse {
        match self.decoders.decode(bytes) {
            Ok(waveform) => self.predict_waveform(&waveform),
            Err(err) => {
                log_audio_error(&err, "InferenceService::predict_bytes");
                InferenceResponse::invalid_audio()
            }
        }
    }

    pub fn predict_waveform(&self, waveform: &Waveform) -> InferenceResponse {
        if waveform.is_empty() || waveform.sample_rate() == 0 {
            tracing::warn!("Rejecting empty waveform");
            return InferenceResponse::invalid_audio();
        }

        let extractor = self.extractor(waveform.sample_rate());
        let features = extractor.extract(waveform.samples());
        match self.classifier.predict_probabilities(features.as_slice()) {
            Ok(probabilities) => {
                tracing::debug!(?probabilities, "Classifier output");
                InferenceResponse::Prediction(decide(&probabilities, &self.labels))
            }
            Err(err) => {
                log_model_error(&err, "InferenceService::predict_waveform");
                InferenceResponse::invalid_audio()
            }
        }
    }

    /// Filterbanks and the FFT plan for `sample_rate`, built on first use.
    fn extractor(&self, sample_rate: u32) -> Arc<FeatureExtractor> {
        let mut cache = self.extractors.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(extractor) = cache.get(&sample_rate) {
            return extractor.clone();
        }

        let extractor = Arc::new(FeatureExtractor::new(sample_rate));
        if cache.len() < MAX_CACHED_EXTRACTORS {
            tracing::debug!(sample_rate, "Caching feature extractor");
            cache.insert(sample_rate, extractor.clone());
        }
        extractor
    }
}
