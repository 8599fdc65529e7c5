//! Inference entrypoint behaviour against a persisted model artifact.

use std::io::Cursor;
use std::path::Path;

use emotion_recognizer::analysis::features;
use emotion_recognizer::analysis::schema::FEATURE_VECTOR_LEN;
use emotion_recognizer::model::{ForestOptions, ModelArtifact, RandomForest};
use emotion_recognizer::{InferenceResponse, InferenceService, Waveform, INVALID_AUDIO_MESSAGE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LABELS: [&str; 5] = ["Neutral", "Fearful", "Happy", "Sad", "Angry"];

fn save_artifact(path: &Path, classes: &[&str]) {
    let mut rng = StdRng::seed_from_u64(3);
    let mut x = Vec::new();
    let mut y = Vec::new();
    for label in 0..classes.len() {
        for _ in 0..8 {
            x.push(
                (0..FEATURE_VECTOR_LEN)
                    .map(|_| rng.gen_range(-50.0..50.0) + label as f32 * 10.0)
                    .collect::<Vec<f32>>(),
            );
            y.push(label);
        }
    }
    let options = ForestOptions {
        n_trees: 8,
        ..ForestOptions::default()
    };
    let forest = RandomForest::fit(&x, &y, classes.len(), &options).expect("fit");
    ModelArtifact::new(forest, classes.iter().map(|c| c.to_string()).collect())
        .save(path)
        .expect("save artifact");
}

fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("writer");
        for &s in samples {
            writer.write_sample(s).expect("sample");
        }
        writer.finalize().expect("finalize");
    }
    cursor.into_inner()
}

fn load_service() -> (tempfile::TempDir, InferenceService) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("emotion_model.json");
    save_artifact(&path, &LABELS);
    let service = InferenceService::load(&path).expect("service loads");
    (dir, service)
}

#[test]
fn silent_clip_yields_well_formed_prediction() {
    let silent = vec![0.0f32; 16000];
    let vector = features::extract(&silent, 16000);
    assert_eq!(vector.len(), FEATURE_VECTOR_LEN);
    assert!(vector.is_finite());

    let (_dir, service) = load_service();
    match service.predict_bytes(&wav_bytes(&vec![0i16; 16000], 16000, 1)) {
        InferenceResponse::Prediction(result) => {
            assert!(LABELS.contains(&result.emotion.as_str()));
            assert_eq!(result.probabilities.len(), 5);
            let total: f32 = result.probabilities.iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-4);
            assert_eq!(
                result.probabilities.get(&result.emotion),
                Some(result.confidence)
            );
            assert_eq!(result.is_confident, result.confidence >= 0.3);
        }
        InferenceResponse::Error { error } => panic!("unexpected error: {error}"),
    }
}

#[test]
fn corrupt_bytes_yield_fixed_error() {
    let (_dir, service) = load_service();
    let payloads: [&[u8]; 4] = [
        b"",
        b"\x00\x01\x02\x03",
        b"RIFF\x10\x00\x00\x00WAVEjunk",
        b"ID3 nope",
    ];
    for payload in payloads {
        let response = service.predict_bytes(payload);
        assert_eq!(
            response,
            InferenceResponse::Error {
                error: INVALID_AUDIO_MESSAGE.to_string()
            }
        );
        let json = serde_json::to_value(&response).expect("json");
        assert_eq!(json["error"], INVALID_AUDIO_MESSAGE);
    }
}

#[test]
fn stereo_upload_matches_premixed_mono() {
    let (_dir, service) = load_service();
    let frames = 8000;
    let mut stereo = Vec::with_capacity(frames * 2);
    let mut mono = Vec::with_capacity(frames);
    for n in 0..frames {
        let left = ((n as f32 * 0.07).sin() * 8000.0) as i16;
        let right = ((n as f32 * 0.013).sin() * 8000.0) as i16;
        stereo.push(left);
        stereo.push(right);
        mono.push((left as f32 + right as f32) / 2.0 / 32768.0);
    }

    let from_stereo = service.predict_bytes(&wav_bytes(&stereo, 16000, 2));
    let from_mono = service.predict_waveform(&Waveform::new(mono, 16000));
    assert!(!from_stereo.is_error());
    assert_eq!(from_stereo, from_mono);
}

#[test]
fn incompatible_artifact_is_fatal_at_startup() {
    let dir = tempfile::tempdir().expect("tempdir");

    let two_class = dir.path().join("two.json");
    save_artifact(&two_class, &["A", "B"]);
    assert!(InferenceService::load(&two_class).is_err());

    let reordered = dir.path().join("reordered.json");
    save_artifact(&reordered, &["Angry", "Sad", "Happy", "Fearful", "Neutral"]);
    assert!(InferenceService::load(&reordered).is_err());

    assert!(InferenceService::load(&dir.path().join("missing.json")).is_err());
}
