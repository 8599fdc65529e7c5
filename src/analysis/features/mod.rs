// FeatureExtractor - DSP feature extraction for speech emotion classification
//
// This module turns a mono waveform into the fixed 58-value descriptor the
// classifier was trained on. Per-frame tracks are computed on one shared STFT
// frame grid and then summarised (mean, population std) across frames.
//
// Module organization:
// - types: FeatureVector and per-frame tracks
// - fft: framed STFT with a periodic Hann window
// - mel: Slaney mel filterbank, power-to-dB and MFCC
// - chroma: 12-bin chroma filterbank
// - spectral: centroid, roll-off, octave-band contrast
// - temporal: zero-crossing rate
// - stats: mean / standard deviation across frames
// - mod.rs: Coordinator (FeatureExtractor) and vector assembly
//
// Vector layout (see analysis::schema):
// [13 MFCC means, 13 MFCC stds, centroid mean/std, rolloff mean/std,
//  contrast mean/std, ZCR mean/std, 12 chroma means, 12 chroma stds]

mod chroma;
mod fft;
mod mel;
mod spectral;
mod stats;
mod temporal;
mod types;

pub use types::{FeatureVector, FrameTracks, NamedFeatures};

use crate::analysis::schema::{
    CENTROID_OFFSET, CHROMA_MEAN_OFFSET, CHROMA_STD_OFFSET, CONTRAST_OFFSET, FEATURE_VECTOR_LEN,
    FRAME_LENGTH, HOP_LENGTH, MFCC_MEAN_OFFSET, MFCC_STD_OFFSET, N_CHROMA, N_MELS, N_MFCC,
    ROLLOFF_OFFSET, ZCR_OFFSET,
};
use crate::audio::Waveform;

use chroma::ChromaFilterbank;
use fft::StftProcessor;
use mel::MfccProcessor;
use spectral::{SpectralContrast, SpectralFeatures};
use stats::mean_std;
use temporal::TemporalFeatures;

/// FeatureExtractor coordinates the DSP feature extraction pipeline
///
/// Filterbanks depend on the sample rate and are built once in `new`. The
/// extractor holds no mutable state, so one instance can be shared across
/// threads.
pub struct FeatureExtractor {
    sample_rate: u32,
    stft: StftProcessor,
    mfcc: MfccProcessor,
    chroma: ChromaFilterbank,
    spectral_features: SpectralFeatures,
    contrast: SpectralContrast,
    temporal_features: TemporalFeatures,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor with the specified sample rate
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz (e.g., 16000)
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            stft: StftProcessor::new(FRAME_LENGTH, HOP_LENGTH),
            mfcc: MfccProcessor::new(sample_rate, FRAME_LENGTH, N_MELS, N_MFCC),
            chroma: ChromaFilterbank::new(sample_rate, FRAME_LENGTH),
            spectral_features: SpectralFeatures::new(sample_rate, FRAME_LENGTH),
            contrast: SpectralContrast::new(sample_rate, FRAME_LENGTH),
            temporal_features: TemporalFeatures::new(FRAME_LENGTH, HOP_LENGTH),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Compute every per-frame track for a mono signal
    pub fn frame_tracks(&self, audio: &[f32]) -> FrameTracks {
        let spectrogram = self.stft.magnitude_spectrogram(audio);
        let power = spectrogram.power();

        let mfcc = self.mfcc.compute(&power);
        let centroid = spectrogram
            .frames
            .iter()
            .map(|frame| self.spectral_features.compute_centroid(frame))
            .collect();
        let rolloff = spectrogram
            .frames
            .iter()
            .map(|frame| self.spectral_features.compute_rolloff(frame))
            .collect();
        let contrast = self
            .contrast
            .compute(&spectrogram.frames)
            .into_iter()
            .next()
            .unwrap_or_default();
        let zcr = self.temporal_features.compute_zcr(audio);
        let chroma = power.iter().map(|frame| self.chroma.compute(frame)).collect();

        FrameTracks {
            mfcc,
            centroid,
            rolloff,
            contrast,
            zcr,
            chroma,
        }
    }

    /// Extract the feature vector from a mono signal
    ///
    /// Silent or very short input is not an error: it yields a well-formed
    /// vector with degenerate (mostly zero) spectral statistics.
    pub fn extract(&self, audio: &[f32]) -> FeatureVector {
        let tracks = self.frame_tracks(audio);
        tracing::debug!(
            samples = audio.len(),
            frames = tracks.centroid.len(),
            sample_rate = self.sample_rate,
            "Extracting features"
        );
        assemble(&tracks)
    }
}

/// Summarise frame tracks into the positional feature vector
pub fn assemble(tracks: &FrameTracks) -> FeatureVector {
    let mut values = [0.0f32; FEATURE_VECTOR_LEN];

    for coeff in 0..N_MFCC {
        let (mean, std) = mean_std(tracks.mfcc.iter().map(|frame| frame[coeff]));
        values[MFCC_MEAN_OFFSET + coeff] = mean;
        values[MFCC_STD_OFFSET + coeff] = std;
    }

    let scalar_tracks = [
        (CENTROID_OFFSET, &tracks.centroid),
        (ROLLOFF_OFFSET, &tracks.rolloff),
        (CONTRAST_OFFSET, &tracks.contrast),
        (ZCR_OFFSET, &tracks.zcr),
    ];
    for (offset, track) in scalar_tracks {
        let (mean, std) = mean_std(track.iter().copied());
        values[offset] = mean;
        values[offset + 1] = std;
    }

    for pitch in 0..N_CHROMA {
        let (mean, std) = mean_std(tracks.chroma.iter().map(|frame| frame[pitch]));
        values[CHROMA_MEAN_OFFSET + pitch] = mean;
        values[CHROMA_STD_OFFSET + pitch] = std;
    }

    FeatureVector::from_array(values)
}

/// Extract features from raw mono samples at `sample_rate`.
pub fn extract(samples: &[f32], sample_rate: u32) -> FeatureVector {
    FeatureExtractor::new(sample_rate).extract(samples)
}

/// Extract features from a decoded waveform.
pub fn extract_waveform(waveform: &Waveform) -> FeatureVector {
    extract(waveform.samples(), waveform.sample_rate())
}

#[cfg(test)]
#[path = "features_tests.rs"]
mod tests;
