// Error types for the emotion recognizer
//
// This module defines custom error types for audio decoding, the classifier
// artifact and the training batch, each carrying a stable numeric code so the
// CLI and HTTP layers can report failures consistently.

mod audio;
mod model;
mod training;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use model::{log_model_error, ModelError, ModelErrorCodes};
pub use training::{TrainingError, TrainingErrorCodes};

/// Stable numeric code plus a human message for every library error
///
/// Codes are grouped by concern: 3xxx decoding, 4xxx model artifact,
/// 5xxx training batch. The CLI prints them; the HTTP layer only logs them.
pub trait ErrorCode {
    fn code(&self) -> i32;

    fn message(&self) -> String;
}
