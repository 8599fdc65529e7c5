//! Labelled corpus loader.
//!
//! Layout: `{corpus_root}/{label_folder}/{*.wav}`. Folder order in the
//! [`LabelMap`] defines the class index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::analysis::FeatureExtractor;
use crate::audio::DecoderChain;
use crate::config::DatasetConfig;
use crate::error::TrainingError;

/// Ordered label folders; position is the class index.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    folders: Vec<String>,
}

impl LabelMap {
    pub fn new(folders: Vec<String>) -> Self {
        Self { folders }
    }

    pub fn from_config(config: &DatasetConfig) -> Self {
        Self::new(config.label_folders.clone())
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn index_of(&self, folder: &str) -> Option<usize> {
        self.folders.iter().position(|f| f == folder)
    }

    /// Class names in index order: folder names minus any ordering prefix
    /// (`01Neutral` → `Neutral`).
    pub fn class_names(&self) -> Vec<String> {
        self.folders
            .iter()
            .map(|folder| {
                let name = folder.trim_start_matches(|c: char| c.is_ascii_digit());
                if name.is_empty() {
                    folder.clone()
                } else {
                    name.to_string()
                }
            })
            .collect()
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::from_config(&DatasetConfig::default())
    }
}

/// Feature matrix and labels from one corpus walk.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// One row of `FEATURE_VECTOR_LEN` values per processed file.
    pub x: Vec<Vec<f32>>,
    /// Class index per row.
    pub y: Vec<usize>,
    /// Files that failed to decode and were left out.
    pub skipped: Vec<PathBuf>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Rows per class index.
    pub fn class_counts(&self, n_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; n_classes];
        for &label in &self.y {
            if let Some(slot) = counts.get_mut(label) {
                *slot += 1;
            }
        }
        counts
    }
}

/// Walk the corpus with the default decoder chain.
pub fn load(corpus_root: &Path, label_map: &LabelMap) -> Result<Dataset, TrainingError> {
    load_with(corpus_root, label_map, &DecoderChain::default())
}

/// Walk the corpus, decoding with `decoders`.
///
/// A file that fails to decode is logged and skipped. A label folder that is
/// missing or unreadable aborts the walk.
pub fn load_with(
    corpus_root: &Path,
    label_map: &LabelMap,
    decoders: &DecoderChain,
) -> Result<Dataset, TrainingError> {
    let mut dataset = Dataset::default();
    let mut extractors: HashMap<u32, FeatureExtractor> = HashMap::new();

    for (label, folder) in label_map.folders().iter().enumerate() {
        let folder_path = corpus_root.join(folder);
        if !folder_path.is_dir() {
            return Err(TrainingError::MissingLabelFolder {
                path: folder_path.display().to_string(),
            });
        }

        let files = wav_files(&folder_path)?;
        tracing::info!(folder = %folder, label, files = files.len(), "Loading label folder");

        for file in files {
            let waveform = match decoders.decode_file(&file) {
                Ok(waveform) => waveform,
                Err(err) => {
                    tracing::error!(path = %file.display(), error = %err, "Skipping unreadable file");
                    dataset.skipped.push(file);
                    continue;
                }
            };

            let extractor = extractors
                .entry(waveform.sample_rate())
                .or_insert_with(|| FeatureExtractor::new(waveform.sample_rate()));
            let features = extractor.extract(waveform.samples());

            dataset.x.push(features.to_vec());
            dataset.y.push(label);
        }
    }

    tracing::info!(
        samples = dataset.len(),
        skipped = dataset.skipped.len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// `.wav` files (any case) directly inside `folder`, sorted by path.
fn wav_files(folder: &Path) -> Result<Vec<PathBuf>, TrainingError> {
    let io_error = |err: std::io::Error| TrainingError::Io {
        path: folder.display().to_string(),
        reason: err.to_string(),
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::schema::FEATURE_VECTOR_LEN;
    use std::f32::consts::PI;

    fn write_tone(path: &Path, freq: f32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for n in 0..4000 {
            let s = (2.0 * PI * freq * n as f32 / 16000.0).sin() * 0.5;
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn two_label_map() -> LabelMap {
        LabelMap::new(vec!["low".to_string(), "high".to_string()])
    }

    #[test]
    fn test_default_label_map() {
        let map = LabelMap::default();
        assert_eq!(map.len(), 5);
        assert_eq!(map.index_of("01Neutral"), Some(0));
        assert_eq!(map.index_of("05Angry"), Some(4));
        assert_eq!(
            map.class_names(),
            vec!["Neutral", "Fearful", "Happy", "Sad", "Angry"]
        );
        assert_eq!(LabelMap::new(vec!["42".to_string()]).class_names(), vec!["42"]);
    }

    #[test]
    fn test_loads_rows_with_labels() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("low")).unwrap();
        std::fs::create_dir(dir.path().join("high")).unwrap();
        write_tone(&dir.path().join("low").join("a.wav"), 220.0);
        write_tone(&dir.path().join("low").join("b.WAV"), 230.0);
        write_tone(&dir.path().join("high").join("c.wav"), 3000.0);
        std::fs::write(dir.path().join("high").join("notes.txt"), b"ignored").unwrap();

        let dataset = load(dir.path(), &two_label_map()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.y, vec![0, 0, 1]);
        assert!(dataset.x.iter().all(|row| row.len() == FEATURE_VECTOR_LEN));
        assert_eq!(dataset.class_counts(2), vec![2, 1]);
        assert!(dataset.skipped.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("low")).unwrap();
        std::fs::create_dir(dir.path().join("high")).unwrap();
        write_tone(&dir.path().join("low").join("good.wav"), 220.0);
        std::fs::write(dir.path().join("low").join("broken.wav"), b"RIFF garbage").unwrap();
        write_tone(&dir.path().join("high").join("good.wav"), 3000.0);

        let dataset = load(dir.path(), &two_label_map()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.skipped.len(), 1);
        assert!(dataset.skipped[0].ends_with("broken.wav"));
    }

    #[test]
    fn test_zero_sample_rate_header_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("low")).unwrap();
        std::fs::create_dir(dir.path().join("high")).unwrap();
        write_tone(&dir.path().join("low").join("good.wav"), 220.0);
        write_tone(&dir.path().join("high").join("good.wav"), 3000.0);

        let bad = dir.path().join("high").join("zero_rate.wav");
        write_tone(&bad, 3000.0);
        let mut bytes = std::fs::read(&bad).unwrap();
        bytes[24..28].copy_from_slice(&0u32.to_le_bytes());
        std::fs::write(&bad, bytes).unwrap();

        let dataset = load(dir.path(), &two_label_map()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.skipped.len(), 1);
        assert!(dataset.skipped[0].ends_with("zero_rate.wav"));
    }

    #[test]
    fn test_missing_label_folder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("low")).unwrap();
        let err = load(dir.path(), &two_label_map()).unwrap_err();
        assert!(matches!(err, TrainingError::MissingLabelFolder { .. }));
    }
}
