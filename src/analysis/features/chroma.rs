// Chroma module - pitch-class energy distribution
//
// Each FFT bin is mapped onto the 12 pitch classes through Gaussian bumps
// centred on the bin's fractional pitch class, weighted towards the middle
// octaves (centre octave 5, width 2). Rows start at C. Per-frame chroma is
// normalised so its loudest pitch class is 1.0.
//
// Tuning is fixed at A440 (no tuning estimation).

use crate::analysis::schema::N_CHROMA;

const A440: f64 = 440.0;
const CENTER_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Octave number of a frequency relative to C0-ish reference (A440 / 16).
fn hz_to_octs(hz: f64) -> f64 {
    (hz / (A440 / 16.0)).log2()
}

/// Chroma filterbank, `weights[pitch_class][bin]`
pub struct ChromaFilterbank {
    weights: Vec<Vec<f32>>,
}

impl ChromaFilterbank {
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        let n_chroma = N_CHROMA as f64;

        // Fractional chroma bin for every FFT bin except DC; DC is placed
        // 1.5 octaves below bin 1 so it gets negligible weight.
        let mut frq_bins = Vec::with_capacity(n_fft);
        for k in 1..n_fft {
            let hz = k as f64 * sample_rate as f64 / n_fft as f64;
            frq_bins.push(n_chroma * hz_to_octs(hz));
        }
        frq_bins.insert(0, frq_bins[0] - 1.5 * n_chroma);

        let mut bin_widths: Vec<f64> = frq_bins
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).max(1.0))
            .collect();
        bin_widths.push(1.0);

        let half = (n_chroma / 2.0).round();
        let mut weights = vec![vec![0.0f64; n_fft]; N_CHROMA];
        for (c, row) in weights.iter_mut().enumerate() {
            for (k, w) in row.iter_mut().enumerate() {
                let d = (frq_bins[k] - c as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma) - half;
                *w = (-0.5 * (2.0 * d / bin_widths[k]).powi(2)).exp();
            }
        }

        // Unit L2 norm per FFT bin.
        for k in 0..n_fft {
            let norm = weights.iter().map(|row| row[k] * row[k]).sum::<f64>().sqrt();
            if norm > f64::MIN_POSITIVE {
                for row in weights.iter_mut() {
                    row[k] /= norm;
                }
            }
        }

        for k in 0..n_fft {
            let octave = frq_bins[k] / n_chroma;
            let emphasis = (-0.5 * ((octave - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
            for row in weights.iter_mut() {
                row[k] *= emphasis;
            }
        }

        // Rows above are anchored at A; rotate so row 0 is C.
        weights.rotate_left(3);

        let n_bins = n_fft / 2 + 1;
        let weights = weights
            .into_iter()
            .map(|row| row[..n_bins].iter().map(|&w| w as f32).collect())
            .collect();

        Self { weights }
    }

    /// Chroma vector for one power spectrum
    ///
    /// All-zero spectra stay all-zero instead of being normalised.
    pub fn compute(&self, power: &[f32]) -> [f32; N_CHROMA] {
        let mut chroma = [0.0f32; N_CHROMA];
        for (slot, row) in chroma.iter_mut().zip(&self.weights) {
            *slot = row.iter().zip(power).map(|(w, p)| w * p).sum();
        }

        let max = chroma.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        if max >= f32::MIN_POSITIVE {
            for v in chroma.iter_mut() {
                *v /= max;
            }
        }
        chroma
    }
}
