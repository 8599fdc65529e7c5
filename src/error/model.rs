// Classifier artifact error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Model error code constants
///
/// Error code range: 4001-4006
pub struct ModelErrorCodes {}

impl ModelErrorCodes {
    pub const IO: i32 = 4001;
    pub const PARSE: i32 = 4002;
    pub const SCHEMA_MISMATCH: i32 = 4003;
    pub const CLASS_COUNT_MISMATCH: i32 = 4004;
    pub const FEATURE_LENGTH_MISMATCH: i32 = 4005;
    pub const INVALID: i32 = 4006;
}

/// Log a model error with structured context
pub fn log_model_error(err: &ModelError, context: &str) {
    error!(
        "Model error in {}: code={}, component=Classifier, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Classifier artifact and query errors
///
/// Load-time variants are fatal for the serving process. A
/// `FeatureLengthMismatch` at query time is a programming error and is never
/// papered over by padding or truncation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Artifact could not be read or written
    Io { path: String, reason: String },

    /// Artifact is not valid JSON for the expected structure
    Parse { reason: String },

    /// Artifact was trained against a different feature schema
    SchemaMismatch { expected: u32, found: u32 },

    /// Artifact classes do not line up with the label table
    ClassCountMismatch { expected: usize, found: usize },

    /// Vector length differs from the trained feature length
    FeatureLengthMismatch { expected: usize, found: usize },

    /// Artifact violates a structural invariant
    Invalid { reason: String },
}

impl ErrorCode for ModelError {
    fn code(&self) -> i32 {
        match self {
            ModelError::Io { .. } => ModelErrorCodes::IO,
            ModelError::Parse { .. } => ModelErrorCodes::PARSE,
            ModelError::SchemaMismatch { .. } => ModelErrorCodes::SCHEMA_MISMATCH,
            ModelError::ClassCountMismatch { .. } => ModelErrorCodes::CLASS_COUNT_MISMATCH,
            ModelError::FeatureLengthMismatch { .. } => ModelErrorCodes::FEATURE_LENGTH_MISMATCH,
            ModelError::Invalid { .. } => ModelErrorCodes::INVALID,
        }
    }

    fn message(&self) -> String {
        match self {
            ModelError::Io { path, reason } => format!("Model I/O failed for {}: {}", path, reason),
            ModelError::Parse { reason } => format!("Model artifact is malformed: {}", reason),
            ModelError::SchemaMismatch { expected, found } => format!(
                "Feature schema version mismatch: expected {}, found {}",
                expected, found
            ),
            ModelError::ClassCountMismatch { expected, found } => {
                format!("Model has {} classes, expected {}", found, expected)
            }
            ModelError::FeatureLengthMismatch { expected, found } => format!(
                "Feature vector has {} values, expected {}",
                found, expected
            ),
            ModelError::Invalid { reason } => format!("Invalid model: {}", reason),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ModelError {}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Parse {
            reason: err.to_string(),
        }
    }
}
