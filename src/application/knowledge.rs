//! Immutable startup context shared by every request.

use std::path::Path;

use crate::adapters::tables::{self, TRAINING_FILE};
use crate::domain::{DiseaseLabelSpace, ReferenceCatalog, SymptomVocabulary, TrainingTable};
use crate::ConfigError;

/// Vocabulary, label space, reference catalog and training rows, loaded once.
///
/// Nothing here is mutated after construction; services hold it behind an
/// `Arc` and read it concurrently.
#[derive(Debug)]
pub struct KnowledgeBase {
    vocabulary: SymptomVocabulary,
    labels: DiseaseLabelSpace,
    catalog: ReferenceCatalog,
    training: TrainingTable,
}

impl KnowledgeBase {
    /// Derive the vocabulary and label space from a training table.
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateSymptom` if the training table repeats a
    /// symptom column.
    pub fn new(training: TrainingTable, catalog: ReferenceCatalog) -> Result<Self, ConfigError> {
        let vocabulary = training.vocabulary()?;
        let labels = training.label_space();
        Ok(Self {
            vocabulary,
            labels,
            catalog,
            training,
        })
    }

    /// Load the training table and all reference tables from `data_dir`.
    ///
    /// # Errors
    /// Returns the first configuration error encountered.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let training = tables::load_training_table(&data_dir.join(TRAINING_FILE))?;
        let catalog = tables::load_catalog(data_dir)?;
        let kb = Self::new(training, catalog)?;
        tracing::info!(
            "Knowledge base ready: {} symptoms, {} diseases",
            kb.vocabulary.len(),
            kb.labels.len()
        );
        Ok(kb)
    }

    #[must_use]
    pub fn vocabulary(&self) -> &SymptomVocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn labels(&self) -> &DiseaseLabelSpace {
        &self.labels
    }

    #[must_use]
    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn training(&self) -> &TrainingTable {
        &self.training
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TableKind;

    fn sample_dir() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample")
    }

    #[test]
    fn test_load_sample() {
        let kb = KnowledgeBase::load(&sample_dir()).expect("Sample data should load");
        assert_eq!(kb.vocabulary().len(), kb.training().symptoms().len());
        assert_eq!(
            kb.labels().names(),
            &["Allergy", "Common Cold", "Fungal infection", "GERD", "Migraine"]
        );
        assert!(kb
            .catalog()
            .lookup(TableKind::Workout, "Fungal infection")
            .is_some());
    }

    #[test]
    fn test_missing_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = KnowledgeBase::load(dir.path());
        assert!(matches!(err, Err(ConfigError::MissingFile(_))));
    }
}
