// FFT module - framed short-time Fourier transform
//
// The signal is centred (zero-padded by half a frame on both sides), cut into
// overlapping frames, windowed with a periodic Hann window and transformed.
// Only the positive-frequency half of each spectrum is kept.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Magnitude spectrogram stored frame-major: `frames[t][bin]`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub n_bins: usize,
}

impl Spectrogram {
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Squared magnitudes, same layout.
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|m| m * m).collect())
            .collect()
    }
}

/// Number of frames produced for `len` samples with centred framing.
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    1 + len / hop_length
}

/// STFT processor with a pre-planned forward FFT
///
/// The plan is shared behind an `Arc` so one processor can serve concurrent
/// callers without locking.
pub struct StftProcessor {
    fft: Arc<dyn Fft<f32>>,
    frame_length: usize,
    hop_length: usize,
    /// Periodic Hann window (pre-computed)
    window: Vec<f32>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `frame_length` - FFT size and frame length in samples
    /// * `hop_length` - Distance between frame starts in samples
    pub fn new(frame_length: usize, hop_length: usize) -> Self {
        let window = (0..frame_length)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f64::consts::PI * i as f64) / frame_length as f64).cos())
                    as f32
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_length);

        Self {
            fft,
            frame_length,
            hop_length,
            window,
        }
    }

    pub fn n_bins(&self) -> usize {
        self.frame_length / 2 + 1
    }

    /// Compute the magnitude spectrogram of `audio`
    ///
    /// Always yields at least one frame, even for empty input.
    pub fn magnitude_spectrogram(&self, audio: &[f32]) -> Spectrogram {
        let pad = self.frame_length / 2;
        let n_frames = frame_count(audio.len(), self.hop_length);
        let n_bins = self.n_bins();

        let mut frames = Vec::with_capacity(n_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.frame_length];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for t in 0..n_frames {
            let start = t * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                // Position in the unpadded signal; outside it the padding is zero.
                let sample = (start + i)
                    .checked_sub(pad)
                    .and_then(|idx| audio.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
        }

        Spectrogram { frames, n_bins }
    }
}

/// Centre frequency of every positive-frequency bin in Hz.
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    (0..=n_fft / 2)
        .map(|i| (i as f64 * sample_rate as f64 / n_fft as f64) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_centred() {
        assert_eq!(frame_count(0, 512), 1);
        assert_eq!(frame_count(1, 512), 1);
        assert_eq!(frame_count(512, 512), 2);
        assert_eq!(frame_count(16000, 512), 32);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sample_rate = 16000;
        let stft = StftProcessor::new(2048, 512);
        let freq = 1000.0;
        let audio: Vec<f32> = (0..8192)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        let spec = stft.magnitude_spectrogram(&audio);
        let middle = &spec.frames[spec.n_frames() / 2];
        let (peak_bin, _) = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        let expected = (freq * 2048.0 / sample_rate as f32).round() as usize;
        assert_eq!(peak_bin, expected);
    }

    #[test]
    fn test_silence_is_zero() {
        let stft = StftProcessor::new(2048, 512);
        let spec = stft.magnitude_spectrogram(&vec![0.0; 1000]);
        assert_eq!(spec.n_bins, 1025);
        assert!(spec.frames.iter().flatten().all(|&m| m == 0.0));
    }

    #[test]
    fn test_fft_frequencies_span_nyquist() {
        let freqs = fft_frequencies(16000, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1024] - 8000.0).abs() < 1e-3);
    }
}
