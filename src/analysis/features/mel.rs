// Mel module - mel filterbank, decibel scaling and MFCC
//
// Uses the Slaney mel scale (linear below 1 kHz, logarithmic above) with
// area-normalised triangular filters. MFCCs are the orthonormal DCT-II of the
// log-mel power spectrum.

use crate::analysis::schema::{AMIN, TOP_DB};

use super::fft::fft_frequencies;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Convert power values to decibels in place
///
/// `10 * log10(max(x, AMIN))`, then clamped to `TOP_DB` below the loudest
/// value of the slice.
pub fn power_to_db(values: &mut [f32]) {
    let mut max_db = f32::NEG_INFINITY;
    for v in values.iter_mut() {
        *v = 10.0 * v.max(AMIN).log10();
        max_db = max_db.max(*v);
    }
    let floor = max_db - TOP_DB;
    for v in values.iter_mut() {
        *v = v.max(floor);
    }
}

/// Triangular mel filterbank, `weights[mel][bin]`
pub struct MelFilterbank {
    weights: Vec<Vec<f32>>,
}

impl MelFilterbank {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let fft_freqs: Vec<f64> = fft_frequencies(sample_rate, n_fft)
            .into_iter()
            .map(f64::from)
            .collect();

        let min_mel = hz_to_mel(0.0);
        let max_mel = hz_to_mel(sample_rate as f64 / 2.0);
        let n_points = n_mels + 2;
        let mel_f: Vec<f64> = (0..n_points)
            .map(|i| {
                let mel = min_mel + i as f64 * (max_mel - min_mel) / (n_points - 1) as f64;
                mel_to_hz(mel)
            })
            .collect();

        let weights = (0..n_mels)
            .map(|m| {
                let lower_width = mel_f[m + 1] - mel_f[m];
                let upper_width = mel_f[m + 2] - mel_f[m + 1];
                let enorm = 2.0 / (mel_f[m + 2] - mel_f[m]);
                fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - mel_f[m]) / lower_width;
                        let upper = (mel_f[m + 2] - f) / upper_width;
                        (lower.min(upper).max(0.0) * enorm) as f32
                    })
                    .collect()
            })
            .collect();

        Self { weights }
    }

    pub fn n_mels(&self) -> usize {
        self.weights.len()
    }

    /// Project one power spectrum onto the mel bands.
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .map(|filter| filter.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect()
    }
}

/// MFCC computation over a whole power spectrogram
pub struct MfccProcessor {
    filterbank: MelFilterbank,
    /// Orthonormal DCT-II basis, `dct[coefficient][mel]`
    dct: Vec<Vec<f32>>,
}

impl MfccProcessor {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, n_mfcc: usize) -> Self {
        let n = n_mels as f64;
        let dct = (0..n_mfcc)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_mels)
                    .map(|i| {
                        let angle =
                            std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
                        (scale * angle.cos()) as f32
                    })
                    .collect()
            })
            .collect();

        Self {
            filterbank: MelFilterbank::new(sample_rate, n_fft, n_mels),
            dct,
        }
    }

    /// Compute MFCCs for every frame, `result[frame][coefficient]`
    ///
    /// The decibel clamp is relative to the loudest mel cell of the whole
    /// clip, so all frames are converted together.
    pub fn compute(&self, power_frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let n_mels = self.filterbank.n_mels();
        let mut log_mel: Vec<f32> = power_frames
            .iter()
            .flat_map(|frame| self.filterbank.apply(frame))
            .collect();
        power_to_db(&mut log_mel);

        log_mel
            .chunks(n_mels)
            .map(|frame| {
                self.dct
                    .iter()
                    .map(|basis| basis.iter().zip(frame).map(|(b, x)| b * x).sum())
                    .collect()
            })
            .collect()
    }
}
