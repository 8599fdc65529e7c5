//! Positional feature schema shared by training and inference.
//!
//! The classifier consumes features by position, never by name, so every
//! producer and consumer of feature vectors reads its layout from here. Any
//! change to the framing constants or block order must bump
//! [`FEATURE_SCHEMA_VERSION`]; trained artifacts record the version they were
//! built against and are rejected on mismatch.

/// Current feature schema version.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Number of MFCC coefficients kept per frame.
pub const N_MFCC: usize = 13;
/// Number of pitch classes in the chromagram.
pub const N_CHROMA: usize = 12;
/// Number of mel bands feeding the MFCC DCT.
pub const N_MELS: usize = 128;

/// STFT frame length in samples (also the FFT size).
pub const FRAME_LENGTH: usize = 2048;
/// Hop between consecutive frames in samples.
pub const HOP_LENGTH: usize = 512;

/// Fraction of spectral energy below the roll-off frequency.
pub const ROLLOFF_PERCENT: f32 = 0.85;
/// Lower edge of the first octave band for spectral contrast (Hz).
pub const CONTRAST_FMIN: f32 = 200.0;
/// Number of octave bands above the base band (yields `CONTRAST_BANDS + 1` rows).
pub const CONTRAST_BANDS: usize = 6;
/// Quantile defining peak/valley energy within a contrast band.
pub const CONTRAST_QUANTILE: f32 = 0.02;

/// Dynamic range clamp for power-to-dB conversion.
pub const TOP_DB: f32 = 80.0;
/// Floor applied to power before taking the logarithm.
pub const AMIN: f32 = 1e-10;

/// Offset of the 13 MFCC means.
pub const MFCC_MEAN_OFFSET: usize = 0;
/// Offset of the 13 MFCC standard deviations.
pub const MFCC_STD_OFFSET: usize = MFCC_MEAN_OFFSET + N_MFCC;
/// Offset of `[centroid mean, centroid std]`.
pub const CENTROID_OFFSET: usize = MFCC_STD_OFFSET + N_MFCC;
/// Offset of `[rolloff mean, rolloff std]`.
pub const ROLLOFF_OFFSET: usize = CENTROID_OFFSET + 2;
/// Offset of `[contrast mean, contrast std]`.
pub const CONTRAST_OFFSET: usize = ROLLOFF_OFFSET + 2;
/// Offset of `[zcr mean, zcr std]`.
pub const ZCR_OFFSET: usize = CONTRAST_OFFSET + 2;
/// Offset of the 12 chroma means.
pub const CHROMA_MEAN_OFFSET: usize = ZCR_OFFSET + 2;
/// Offset of the 12 chroma standard deviations.
pub const CHROMA_STD_OFFSET: usize = CHROMA_MEAN_OFFSET + N_CHROMA;

/// Total number of `f32` values per feature vector.
pub const FEATURE_VECTOR_LEN: usize = CHROMA_STD_OFFSET + N_CHROMA;

const PITCH_CLASSES: [&str; N_CHROMA] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Human-readable name for every position, in schema order.
pub fn feature_names() -> Vec<String> {
    let mut names = Vec::with_capacity(FEATURE_VECTOR_LEN);
    for i in 0..N_MFCC {
        names.push(format!("mfcc_{i}_mean"));
    }
    for i in 0..N_MFCC {
        names.push(format!("mfcc_{i}_std"));
    }
    for block in ["centroid", "rolloff", "contrast", "zcr"] {
        names.push(format!("{block}_mean"));
        names.push(format!("{block}_std"));
    }
    for pitch in PITCH_CLASSES {
        names.push(format!("chroma_{pitch}_mean"));
    }
    for pitch in PITCH_CLASSES {
        names.push(format!("chroma_{pitch}_std"));
    }
    names
}
