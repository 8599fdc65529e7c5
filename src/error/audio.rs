// Audio decoding error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 3001-3004
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Bytes could not be decoded by any strategy
    pub const DECODE_FAILED: i32 = 3001;

    /// Input decoded to zero samples (or was zero bytes long)
    pub const EMPTY_INPUT: i32 = 3002;

    /// Container was readable but carried no audio track
    pub const NO_AUDIO_TRACK: i32 = 3003;

    /// Sample format the decoder cannot represent as f32
    pub const UNSUPPORTED_FORMAT: i32 = 3004;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioDecoder, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio decoding errors
///
/// These are the "decode errors" of the error taxonomy: recovered at the
/// inference boundary and surfaced as a generic invalid-audio outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Decoder rejected the bytes
    DecodeFailed { decoder: String, reason: String },

    /// Nothing to decode, or decoding produced no samples
    EmptyInput,

    /// Container had no decodable audio track
    NoAudioTrack,

    /// Sample format is not supported by the decoder
    UnsupportedFormat { details: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DecodeFailed { .. } => AudioErrorCodes::DECODE_FAILED,
            AudioError::EmptyInput => AudioErrorCodes::EMPTY_INPUT,
            AudioError::NoAudioTrack => AudioErrorCodes::NO_AUDIO_TRACK,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DecodeFailed { decoder, reason } => {
                format!("{} decoder failed: {}", decoder, reason)
            }
            AudioError::EmptyInput => "Audio input contains no samples".to_string(),
            AudioError::NoAudioTrack => "No audio track found in input".to_string(),
            AudioError::UnsupportedFormat { details } => {
                format!("Unsupported sample format: {}", details)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::DecodeFailed {
                decoder: "wav".to_string(),
                reason: "bad header".to_string()
            }
            .code(),
            AudioErrorCodes::DECODE_FAILED
        );
        assert_eq!(AudioError::EmptyInput.code(), AudioErrorCodes::EMPTY_INPUT);
        assert_eq!(
            AudioError::NoAudioTrack.code(),
            AudioErrorCodes::NO_AUDIO_TRACK
        );
        assert_eq!(
            AudioError::UnsupportedFormat {
                details: "12-bit".to_string()
            }
            .code(),
            AudioErrorCodes::UNSUPPORTED_FORMAT
        );
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::DecodeFailed {
            decoder: "wav".to_string(),
            reason: "bad header".to_string(),
        };
        assert_eq!(err.message(), "wav decoder failed: bad header");

        let err = AudioError::EmptyInput;
        assert!(err.message().contains("no samples"));
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::NoAudioTrack;
        let display = format!("{}", err);
        assert!(display.contains("AudioError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
