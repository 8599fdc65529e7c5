// Training batch error types and constants
//
// Training failures are fatal for the batch: there is no request to recover to.

use crate::error::ErrorCode;
use std::fmt;

/// Training error code constants
///
/// Error code range: 5001-5005
pub struct TrainingErrorCodes {}

impl TrainingErrorCodes {
    pub const EMPTY_DATASET: i32 = 5001;
    pub const SINGLE_CLASS: i32 = 5002;
    pub const MISMATCHED_LENGTHS: i32 = 5003;
    pub const MISSING_LABEL_FOLDER: i32 = 5004;
    pub const IO: i32 = 5005;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainingError {
    /// No usable samples (or too few to hold out a test split)
    EmptyDataset { samples: usize },

    /// Every sample carries the same label
    SingleClass { label: usize },

    /// Feature rows and labels disagree in count, or rows disagree in width
    MismatchedLengths { reason: String },

    /// A label folder named in the label map does not exist
    MissingLabelFolder { path: String },

    /// Directory traversal failed
    Io { path: String, reason: String },
}

impl ErrorCode for TrainingError {
    fn code(&self) -> i32 {
        match self {
            TrainingError::EmptyDataset { .. } => TrainingErrorCodes::EMPTY_DATASET,
            TrainingError::SingleClass { .. } => TrainingErrorCodes::SINGLE_CLASS,
            TrainingError::MismatchedLengths { .. } => TrainingErrorCodes::MISMATCHED_LENGTHS,
            TrainingError::MissingLabelFolder { .. } => TrainingErrorCodes::MISSING_LABEL_FOLDER,
            TrainingError::Io { .. } => TrainingErrorCodes::IO,
        }
    }

    fn message(&self) -> String {
        match self {
            TrainingError::EmptyDataset { samples } => {
                format!("Dataset too small to train on ({} samples)", samples)
            }
            TrainingError::SingleClass { label } => {
                format!("Dataset contains only one class (label {})", label)
            }
            TrainingError::MismatchedLengths { reason } => {
                format!("Mismatched dataset shape: {}", reason)
            }
            TrainingError::MissingLabelFolder { path } => {
                format!("Label folder not found: {}", path)
            }
            TrainingError::Io { path, reason } => format!("Failed to read {}: {}", path, reason),
        }
    }
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrainingError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TrainingError {}
