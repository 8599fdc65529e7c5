// Decision layer - maps a class probability distribution to a prediction
//
// Pure and stateless: the only input besides the distribution is the static
// label/threshold table. Index `i` of the distribution belongs to label `i`.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Default confidence threshold shared by all five labels
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// A recognised category and the minimum probability that counts as confident
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionLabel {
    pub name: &'static str,
    pub threshold: f32,
}

/// Sentinel used when the argmax index has no entry in the table.
///
/// Its threshold is 0.0, so a prediction that falls back to it is always
/// reported as confident.
pub const UNKNOWN_LABEL: EmotionLabel = EmotionLabel {
    name: "Unknown",
    threshold: 0.0,
};

static DEFAULT_LABELS: [EmotionLabel; 5] = [
    EmotionLabel { name: "Neutral", threshold: DEFAULT_THRESHOLD },
    EmotionLabel { name: "Fearful", threshold: DEFAULT_THRESHOLD },
    EmotionLabel { name: "Happy", threshold: DEFAULT_THRESHOLD },
    EmotionLabel { name: "Sad", threshold: DEFAULT_THRESHOLD },
    EmotionLabel { name: "Angry", threshold: DEFAULT_THRESHOLD },
];

/// Ordered, read-only label table
///
/// Order is the class index order the classifier was trained with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelTable {
    labels: &'static [EmotionLabel],
}

impl LabelTable {
    /// Wrap a static table (used by tests to exercise other layouts).
    pub const fn new(labels: &'static [EmotionLabel]) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EmotionLabel> {
        self.labels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmotionLabel> {
        self.labels.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.labels.iter().map(|label| label.name).collect()
    }
}

impl Default for LabelTable {
    /// Neutral, Fearful, Happy, Sad, Angry, all at 0.3.
    fn default() -> Self {
        Self::new(&DEFAULT_LABELS)
    }
}

/// Outcome of one inference call
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PredictionResult {
    pub emotion: String,
    pub confidence: f32,
    pub is_confident: bool,
    pub probabilities: ProbabilityMap,
}

/// Label name → probability, kept in label order
///
/// Serializes as a JSON object whose keys follow the label table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityMap {
    entries: Vec<(String, f32)>,
}

impl ProbabilityMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), *p))
    }
}

impl Serialize for ProbabilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, probability) in &self.entries {
            map.serialize_entry(name, probability)?;
        }
        map.end()
    }
}

/// Index of the maximum value, lowest index on ties.
///
/// NaN entries never win. Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Turn a class distribution into a [`PredictionResult`]
///
/// Probabilities past the end of the table are named `class_{i}` in the map;
/// an argmax past the end falls back to [`UNKNOWN_LABEL`].
pub fn decide(probabilities: &[f32], labels: &LabelTable) -> PredictionResult {
    let predicted = argmax(probabilities);

    let (label, confidence) = match predicted {
        Some(index) => (
            labels.get(index).copied().unwrap_or(UNKNOWN_LABEL),
            probabilities[index],
        ),
        None => (UNKNOWN_LABEL, 0.0),
    };

    let entries = probabilities
        .iter()
        .enumerate()
        .map(|(index, &p)| {
            let name = match labels.get(index) {
                Some(label) => label.name.to_string(),
                None => format!("class_{}", index),
            };
            (name, p)
        })
        .collect();

    let result = PredictionResult {
        emotion: label.name.to_string(),
        confidence,
        is_confident: confidence >= label.threshold,
        probabilities: ProbabilityMap { entries },
    };

    tracing::debug!(
        emotion = %result.emotion,
        confidence = result.confidence,
        is_confident = result.is_confident,
        "Decision made"
    );

    result
}
