//! Training table: the source of the vocabulary and the label space.
//!
//! Only the column layout and the distinct labels are used at runtime.
//! Rows are kept (deduplicated) so the exemplar model can match against them.

use std::collections::HashSet;

use super::vocabulary::{DiseaseLabelSpace, FeatureVector, SymptomVocabulary};
use crate::ConfigError;

/// One deduplicated training row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrainingRow {
    pub features: FeatureVector,
    pub label: String,
}

/// Symptom columns plus labeled rows.
#[derive(Debug, Clone)]
pub struct TrainingTable {
    symptoms: Vec<String>,
    rows: Vec<TrainingRow>,
}

impl TrainingTable {
    /// Build a training table, dropping duplicate rows (first occurrence wins).
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidTrainingData` if there are no symptom
    /// columns, no rows, or a row does not match the column count.
    pub fn new(symptoms: Vec<String>, rows: Vec<TrainingRow>) -> Result<Self, ConfigError> {
        if symptoms.is_empty() {
            return Err(ConfigError::InvalidTrainingData(
                "no symptom columns".to_string(),
            ));
        }
        if rows.is_empty() {
            return Err(ConfigError::InvalidTrainingData("no rows".to_string()));
        }

        let mut seen = HashSet::with_capacity(rows.len());
        let mut unique = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            if row.features.len() != symptoms.len() {
                return Err(ConfigError::InvalidTrainingData(format!(
                    "row {idx} has {} features, expected {}",
                    row.features.len(),
                    symptoms.len()
                )));
            }
            if seen.insert(row.clone()) {
                unique.push(row);
            }
        }

        Ok(Self {
            symptoms,
            rows: unique,
        })
    }

    /// Symptom column names in feature order.
    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    /// Deduplicated rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[TrainingRow] {
        &self.rows
    }

    /// Derive the symptom vocabulary.
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateSymptom` on repeated column names.
    pub fn vocabulary(&self) -> Result<SymptomVocabulary, ConfigError> {
        SymptomVocabulary::new(self.symptoms.clone())
    }

    /// Derive the label space from the distinct row labels.
    #[must_use]
    pub fn label_space(&self) -> DiseaseLabelSpace {
        DiseaseLabelSpace::from_labels(self.rows.iter().map(|r| r.label.clone()))
    }

    /// Symptom names set in a row.
    #[must_use]
    pub fn symptoms_of(&self, row: &TrainingRow) -> Vec<&str> {
        row.features
            .as_slice()
            .iter()
            .zip(&self.symptoms)
            .filter(|(&bit, _)| bit == 1)
            .map(|(_, name)| name.as_str())
            .collect()
    }
}
