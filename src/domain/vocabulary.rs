//! Symptom vocabulary, feature vectors and the disease label space.
//!
//! The vocabulary fixes the feature layout: position `i` of every
//! [`FeatureVector`] refers to the `i`-th symptom column of the training
//! table. The label space maps classifier output ids to disease names.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Ordered, duplicate-free list of recognized symptom names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomVocabulary {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl SymptomVocabulary {
    /// Build a vocabulary from symptom names in feature order.
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateSymptom` if a name appears twice.
    pub fn new(names: Vec<String>) -> Result<Self, ConfigError> {
        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateSymptom(name.clone()));
            }
        }
        Ok(Self { names, positions })
    }

    /// Number of symptoms, which is also the feature vector length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Symptom names in feature order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Feature index of a symptom (exact match).
    #[must_use]
    pub fn position(&self, symptom: &str) -> Option<usize> {
        self.positions.get(symptom).copied()
    }

    #[must_use]
    pub fn contains(&self, symptom: &str) -> bool {
        self.positions.contains_key(symptom)
    }

    /// Encode a symptom selection into a binary feature vector.
    ///
    /// Names outside the vocabulary are ignored. Duplicates and selection
    /// order have no effect on the result.
    #[must_use]
    pub fn encode<I, S>(&self, selected: I) -> FeatureVector
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bits = vec![0u8; self.names.len()];
        for symptom in selected {
            if let Some(idx) = self.position(symptom.as_ref()) {
                bits[idx] = 1;
            }
        }
        FeatureVector(bits)
    }

    /// Names from a selection that the vocabulary does not recognize,
    /// deduplicated and sorted.
    #[must_use]
    pub fn unrecognized<I, S>(&self, selected: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        selected
            .into_iter()
            .filter(|s| !self.contains(s.as_ref()))
            .map(|s| s.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Fixed-length 0/1 feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    /// Wrap raw bits. Any non-zero value is normalized to 1.
    #[must_use]
    pub fn from_bits(bits: Vec<u8>) -> Self {
        Self(bits.into_iter().map(|b| u8::from(b != 0)).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of set positions.
    #[must_use]
    pub fn ones(&self) -> usize {
        self.0.iter().filter(|&&b| b == 1).count()
    }

    /// Feature values as floats for model scoring.
    #[must_use]
    pub fn to_f64(&self) -> Vec<f64> {
        self.0.iter().map(|&b| f64::from(b)).collect()
    }

    /// Hamming distance to another vector of the same length.
    ///
    /// Returns `None` when lengths differ.
    #[must_use]
    pub fn hamming(&self, other: &Self) -> Option<usize> {
        if self.len() != other.len() {
            return None;
        }
        Some(self.0.iter().zip(&other.0).filter(|(a, b)| a != b).count())
    }
}

/// Class identifier emitted by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub usize);

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bijection between class ids and disease names.
///
/// Class ids are the positions of the distinct labels in sorted order,
/// matching how the training pipeline encodes its targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseLabelSpace {
    names: Vec<String>,
    ids: HashMap<String, ClassId>,
}

impl DiseaseLabelSpace {
    /// Build the label space from raw labels (duplicates allowed).
    #[must_use]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), ClassId(idx)))
            .collect();
        Self { names, ids }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Disease name for a class id.
    #[must_use]
    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Class id for a disease name (exact match).
    #[must_use]
    pub fn id(&self, disease: &str) -> Option<ClassId> {
        self.ids.get(disease).copied()
    }

    /// Disease names ordered by class id.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
