// Temporal module - Time-domain feature extraction
//
// Zero-crossing rate is measured per frame on the same frame grid as the
// STFT. The signal is centred by repeating its edge samples for half a frame
// on each side.

/// Samples with magnitude at or below this count as zero (non-negative).
const ZERO_THRESHOLD: f32 = 1e-10;

/// Temporal feature computation functions
pub struct TemporalFeatures {
    frame_length: usize,
    hop_length: usize,
}

impl TemporalFeatures {
    pub fn new(frame_length: usize, hop_length: usize) -> Self {
        Self {
            frame_length,
            hop_length,
        }
    }

    /// Zero-crossing rate for every frame
    ///
    /// Rate = sign changes within the frame / frame length. A sample that is
    /// (near) zero counts as positive.
    pub fn compute_zcr(&self, audio: &[f32]) -> Vec<f32> {
        let n_frames = super::fft::frame_count(audio.len(), self.hop_length);
        if audio.is_empty() {
            return vec![0.0; n_frames];
        }

        let pad = self.frame_length / 2;
        let last = audio.len() - 1;
        let sample_at = |padded_idx: usize| -> f32 {
            let idx = padded_idx.saturating_sub(pad).min(last);
            audio[idx]
        };
        let is_negative = |x: f32| x.abs() > ZERO_THRESHOLD && x.is_sign_negative();

        (0..n_frames)
            .map(|t| {
                let start = t * self.hop_length;
                let mut crossings = 0usize;
                let mut previous = is_negative(sample_at(start));
                for i in 1..self.frame_length {
                    let current = is_negative(sample_at(start + i));
                    if current != previous {
                        crossings += 1;
                    }
                    previous = current;
                }
                crossings as f32 / self.frame_length as f32
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zcr_alternating_signal() {
        let temporal = TemporalFeatures::new(8, 4);
        let audio: Vec<f32> = (0..32).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let zcr = temporal.compute_zcr(&audio);
        assert_eq!(zcr.len(), 9);
        // Interior frames change sign at every sample step: 7 of 8.
        assert!((zcr[4] - 7.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_zcr_silence_is_zero() {
        let temporal = TemporalFeatures::new(2048, 512);
        let zcr = temporal.compute_zcr(&vec![0.0; 4000]);
        assert!(zcr.iter().all(|&z| z == 0.0));
    }

    #[test]
    fn test_zcr_single_sample() {
        let temporal = TemporalFeatures::new(2048, 512);
        let zcr = temporal.compute_zcr(&[-0.5]);
        assert_eq!(zcr, vec![0.0]);
    }

    #[test]
    fn test_tiny_values_count_as_zero() {
        let temporal = TemporalFeatures::new(4, 4);
        let zcr = temporal.compute_zcr(&[1e-12, -1e-12, 1e-12, -1e-12]);
        assert!(zcr.iter().all(|&z| z == 0.0));
    }
}
