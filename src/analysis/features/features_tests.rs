use super::*;
use crate::analysis::schema::N_CHROMA;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate pure sine wave for testing
fn generate_sine_wave(sample_rate: u32, frequency: f32, duration_samples: usize) -> Vec<f32> {
    (0..duration_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.5 * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate seeded white noise for testing
fn generate_white_noise(duration_samples: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..duration_samples)
        .map(|_| rng.gen_range(-0.5..0.5))
        .collect()
}

#[test]
fn test_vector_has_schema_length_and_finite_values() {
    let sample_rate = 16000;
    let signal = generate_sine_wave(sample_rate, 440.0, sample_rate as usize);
    let features = extract(&signal, sample_rate);

    assert_eq!(features.len(), FEATURE_VECTOR_LEN);
    assert!(features.is_finite(), "non-finite features: {:?}", features);
}

#[test]
fn test_extraction_is_deterministic() {
    let sample_rate = 22050;
    let signal = generate_white_noise(11025, 7);
    let extractor = FeatureExtractor::new(sample_rate);

    let first = extractor.extract(&signal);
    let second = extractor.extract(&signal);
    let fresh = extract(&signal, sample_rate);

    assert_eq!(first.as_slice(), second.as_slice());
    assert_eq!(first.as_slice(), fresh.as_slice());
}

#[test]
fn test_stereo_average_matches_premixed_mono() {
    let sample_rate = 16000;
    let left = generate_sine_wave(sample_rate, 300.0, 8000);
    let right = generate_white_noise(8000, 3);

    let interleaved: Vec<f32> = left
        .iter()
        .zip(&right)
        .flat_map(|(&l, &r)| [l, r])
        .collect();
    let stereo = Waveform::from_interleaved(&interleaved, 2, sample_rate);

    let premixed: Vec<f32> = left
        .iter()
        .zip(&right)
        .map(|(&l, &r)| (l + r) / 2.0)
        .collect();

    let from_stereo = extract_waveform(&stereo);
    let from_mono = extract(&premixed, sample_rate);
    assert_eq!(from_stereo.as_slice(), from_mono.as_slice());
}

#[test]
fn test_silent_second_is_degenerate_but_well_formed() {
    let sample_rate = 16000;
    let silence = vec![0.0; sample_rate as usize];
    let features = extract(&silence, sample_rate);

    assert_eq!(features.len(), FEATURE_VECTOR_LEN);
    assert!(features.is_finite());
    assert_eq!(features[CENTROID_OFFSET], 0.0);
    assert_eq!(features[ROLLOFF_OFFSET], 0.0);
    assert_eq!(features[ZCR_OFFSET], 0.0);
    for pitch in 0..N_CHROMA {
        assert_eq!(features[CHROMA_MEAN_OFFSET + pitch], 0.0);
        assert_eq!(features[CHROMA_STD_OFFSET + pitch], 0.0);
    }
    // Stationary input: nothing varies across frames.
    for coeff in 0..N_MFCC {
        assert!(features[MFCC_STD_OFFSET + coeff].abs() < 1e-3);
    }
}

#[test]
fn test_single_sample_input() {
    let features = extract(&[0.25], 16000);
    assert_eq!(features.len(), FEATURE_VECTOR_LEN);
    assert!(features.is_finite());
    // One frame: every standard deviation is zero.
    assert_eq!(features[CENTROID_OFFSET + 1], 0.0);
    assert_eq!(features[ZCR_OFFSET + 1], 0.0);
}

#[test]
fn test_centroid_tracks_pitch() {
    let sample_rate = 16000;
    let low = extract(&generate_sine_wave(sample_rate, 200.0, 8000), sample_rate);
    let high = extract(&generate_sine_wave(sample_rate, 4000.0, 8000), sample_rate);

    assert!(
        low[CENTROID_OFFSET] < high[CENTROID_OFFSET],
        "Expected 200 Hz centroid {} < 4000 Hz centroid {}",
        low[CENTROID_OFFSET],
        high[CENTROID_OFFSET]
    );
    assert!(low[ROLLOFF_OFFSET] < high[ROLLOFF_OFFSET]);
}

#[test]
fn test_zcr_sine_vs_noise() {
    let sample_rate = 16000;
    let sine = extract(&generate_sine_wave(sample_rate, 100.0, 8000), sample_rate);
    let noise = extract(&generate_white_noise(8000, 11), sample_rate);

    assert!(
        noise[ZCR_OFFSET] > 0.3,
        "Expected noise ZCR > 0.3, got {}",
        noise[ZCR_OFFSET]
    );
    assert!(
        sine[ZCR_OFFSET] < 0.05,
        "Expected sine ZCR < 0.05, got {}",
        sine[ZCR_OFFSET]
    );
}

#[test]
fn test_chroma_means_bounded() {
    let sample_rate = 22050;
    let features = extract(&generate_sine_wave(sample_rate, 261.63, 22050), sample_rate);
    for pitch in 0..N_CHROMA {
        let mean = features[CHROMA_MEAN_OFFSET + pitch];
        assert!((0.0..=1.0).contains(&mean), "chroma mean {} out of range", mean);
    }
    // Middle C dominates pitch class C.
    assert!(features[CHROMA_MEAN_OFFSET] > 0.9);
}

#[test]
fn test_frame_tracks_share_frame_grid() {
    let extractor = FeatureExtractor::new(16000);
    let tracks = extractor.frame_tracks(&generate_white_noise(5000, 5));
    let n_frames = 1 + 5000 / HOP_LENGTH;

    assert_eq!(tracks.mfcc.len(), n_frames);
    assert_eq!(tracks.centroid.len(), n_frames);
    assert_eq!(tracks.rolloff.len(), n_frames);
    assert_eq!(tracks.contrast.len(), n_frames);
    assert_eq!(tracks.zcr.len(), n_frames);
    assert_eq!(tracks.chroma.len(), n_frames);
}

#[test]
fn test_named_features_keep_schema_order() {
    let features = extract(&generate_sine_wave(16000, 440.0, 4000), 16000);
    let text = serde_json::to_string(&features.named()).unwrap();

    let object: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(object.as_object().unwrap().len(), FEATURE_VECTOR_LEN);

    let names = crate::analysis::schema::feature_names();
    let positions: Vec<usize> = names
        .iter()
        .map(|name| text.find(&format!("\"{name}\"")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(text.starts_with("{\"mfcc_0_mean\":"));
}
