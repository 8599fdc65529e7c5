// Spectral module - Frequency-domain feature extraction
//
// This module computes per-frame spectral features from magnitude spectra.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Jiang, D. et al. (2002). Music type classification by spectral contrast feature

use crate::analysis::schema::{CONTRAST_BANDS, CONTRAST_FMIN, CONTRAST_QUANTILE, ROLLOFF_PERCENT};

use super::fft::fft_frequencies;
use super::mel::power_to_db;

/// Spectral feature computation functions
pub struct SpectralFeatures {
    frequencies: Vec<f32>,
}

impl SpectralFeatures {
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT window size
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        Self {
            frequencies: fft_frequencies(sample_rate, fft_size),
        }
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// # Returns
    /// Spectral centroid in Hz, 0.0 for a silent frame
    pub fn compute_centroid(&self, spectrum: &[f32]) -> f32 {
        let magnitude_sum: f64 = spectrum.iter().map(|&m| f64::from(m)).sum();
        if magnitude_sum < f64::from(f32::MIN_POSITIVE) {
            return 0.0;
        }

        let weighted_sum: f64 = spectrum
            .iter()
            .zip(&self.frequencies)
            .map(|(&mag, &freq)| f64::from(freq) * f64::from(mag))
            .sum();

        (weighted_sum / magnitude_sum) as f32
    }

    /// Compute spectral rolloff
    ///
    /// Lowest bin frequency at which the cumulative magnitude reaches
    /// `ROLLOFF_PERCENT` of the frame total. A silent frame rolls off at 0 Hz.
    pub fn compute_rolloff(&self, spectrum: &[f32]) -> f32 {
        let total: f64 = spectrum.iter().map(|&m| f64::from(m)).sum();
        let threshold = f64::from(ROLLOFF_PERCENT) * total;

        let mut cumulative = 0.0f64;
        for (&mag, &freq) in spectrum.iter().zip(&self.frequencies) {
            cumulative += f64::from(mag);
            if cumulative >= threshold {
                return freq;
            }
        }

        // Rounding left the running sum short of the threshold.
        self.frequencies
            .get(spectrum.len().saturating_sub(1))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Bins belonging to one contrast band, with the quantile width
struct ContrastBand {
    bins: Vec<usize>,
    quantile_count: usize,
}

/// Octave-band spectral contrast
///
/// Band 0 spans 0..`CONTRAST_FMIN` Hz; band k spans the k-th octave above it,
/// the last band extending to Nyquist. Neighbouring bands share one edge bin.
/// Bands with no bins (sample rates too low for the top octaves) report 0.
pub struct SpectralContrast {
    bands: Vec<Option<ContrastBand>>,
}

impl SpectralContrast {
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        let frequencies = fft_frequencies(sample_rate, fft_size);

        let mut edges = vec![0.0f32];
        edges.extend((0..=CONTRAST_BANDS).map(|k| CONTRAST_FMIN * 2f32.powi(k as i32)));

        let bands = (0..=CONTRAST_BANDS)
            .map(|k| {
                let (f_low, f_high) = (edges[k], edges[k + 1]);
                let mut mask: Vec<bool> = frequencies
                    .iter()
                    .map(|&f| f >= f_low && f <= f_high)
                    .collect();
                let first = mask.iter().position(|&m| m)?;
                let last = mask.iter().rposition(|&m| m)?;

                if k > 0 {
                    if let Some(below) = first.checked_sub(1) {
                        mask[below] = true;
                    }
                }
                if k == CONTRAST_BANDS {
                    for m in mask.iter_mut().skip(last + 1) {
                        *m = true;
                    }
                }

                let band_size = mask.iter().filter(|&&m| m).count();
                let mut bins: Vec<usize> = mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &m)| m.then_some(i))
                    .collect();
                if k < CONTRAST_BANDS {
                    bins.pop();
                }
                if bins.is_empty() {
                    return None;
                }

                let quantile_count =
                    ((f64::from(CONTRAST_QUANTILE) * band_size as f64).round_ties_even() as usize)
                        .max(1)
                        .min(bins.len());

                Some(ContrastBand {
                    bins,
                    quantile_count,
                })
            })
            .collect();

        Self { bands }
    }

    pub fn n_bands(&self) -> usize {
        self.bands.len()
    }

    /// Contrast in dB for every band and frame, `result[band][frame]`
    ///
    /// Peaks and valleys are converted to dB as two whole matrices, so the
    /// `TOP_DB` floor is set by the loudest band of the clip.
    pub fn compute(&self, magnitude_frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let n_frames = magnitude_frames.len();
        let active: Vec<&ContrastBand> = self.bands.iter().flatten().collect();

        let mut peaks = Vec::with_capacity(active.len() * n_frames);
        let mut valleys = Vec::with_capacity(active.len() * n_frames);
        for band in &active {
            Self::band_extremes(band, magnitude_frames, &mut peaks, &mut valleys);
        }
        power_to_db(&mut peaks);
        power_to_db(&mut valleys);

        let mut rows = peaks
            .chunks(n_frames.max(1))
            .zip(valleys.chunks(n_frames.max(1)))
            .map(|(p, v)| p.iter().zip(v).map(|(p, v)| p - v).collect::<Vec<f32>>());
        self.bands
            .iter()
            .map(|band| match band {
                Some(_) => rows.next().unwrap_or_else(|| vec![0.0; n_frames]),
                None => vec![0.0; n_frames],
            })
            .collect()
    }

    /// Mean of the top and bottom quantile of `band`, per frame, in power units.
    fn band_extremes(
        band: &ContrastBand,
        magnitude_frames: &[Vec<f32>],
        peaks: &mut Vec<f32>,
        valleys: &mut Vec<f32>,
    ) {
        let q = band.quantile_count;
        for frame in magnitude_frames {
            let mut sub_band: Vec<f32> = band.bins.iter().map(|&i| frame[i]).collect();
            sub_band.sort_by(|a, b| a.total_cmp(b));
            let n = sub_band.len();
            valleys.push(sub_band[..q].iter().sum::<f32>() / q as f32);
            peaks.push(sub_band[n - q..].iter().sum::<f32>() / q as f32);
        }
    }
}
