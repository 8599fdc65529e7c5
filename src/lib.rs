// Emotion Recognizer Core - speech emotion classification from audio clips
// Feature extraction, random forest training and a shared inference service

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod inference;
pub mod model;
pub mod training;

// Re-exports for convenience
pub use analysis::{decide, EmotionLabel, FeatureExtractor, FeatureVector, LabelTable, PredictionResult};
pub use audio::{DecoderChain, Waveform};
pub use config::AppConfig;
pub use inference::{InferenceResponse, InferenceService, INVALID_AUDIO_MESSAGE};

use tracing_subscriber::EnvFilter;

/// Initialize logging for binaries
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. "info") applies.
/// Calling this more than once is harmless.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
