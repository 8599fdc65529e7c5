// Types module - Data structures for audio features

use std::ops::Index;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::analysis::schema::{feature_names, FEATURE_VECTOR_LEN};

/// Fixed-length descriptor of one clip
///
/// Values are laid out exactly as `analysis::schema` describes. The classifier
/// reads them positionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; FEATURE_VECTOR_LEN],
}

impl FeatureVector {
    pub fn from_array(values: [f32; FEATURE_VECTOR_LEN]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }

    pub fn len(&self) -> usize {
        FEATURE_VECTOR_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Feature values keyed by schema name
    ///
    /// Serializes as a map whose keys keep schema order.
    pub fn named(&self) -> NamedFeatures<'_> {
        NamedFeatures {
            names: feature_names(),
            values: &self.values,
        }
    }
}

/// Name-keyed view of a [`FeatureVector`], see [`FeatureVector::named`]
pub struct NamedFeatures<'a> {
    names: Vec<String>,
    values: &'a [f32; FEATURE_VECTOR_LEN],
}

impl Serialize for NamedFeatures<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, value) in self.names.iter().zip(self.values.iter()) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Index<usize> for FeatureVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.values[index]
    }
}

/// Per-frame measurements before summarisation
///
/// Every track has one entry per STFT frame.
#[derive(Debug, Clone, Default)]
pub struct FrameTracks {
    /// `mfcc[frame][coefficient]`
    pub mfcc: Vec<Vec<f32>>,
    pub centroid: Vec<f32>,
    pub rolloff: Vec<f32>,
    /// Base contrast band (0 to `CONTRAST_FMIN` Hz) per frame
    pub contrast: Vec<f32>,
    pub zcr: Vec<f32>,
    /// `chroma[frame][pitch_class]`
    pub chroma: Vec<[f32; crate::analysis::schema::N_CHROMA]>,
}
