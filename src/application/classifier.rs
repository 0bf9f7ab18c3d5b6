//! Classifier adapter: binds a model to the vocabulary and label space.

use crate::domain::{DiseaseLabelSpace, FeatureVector, SymptomVocabulary};
use crate::ports::{Classifier, ModelError};
use crate::ConfigError;

/// A classifier checked against the loaded vocabulary and label space.
///
/// All compatibility checks happen in [`ClassifierAdapter::new`]; a model that
/// passes them cannot disagree with the vocabulary at request time.
pub struct ClassifierAdapter<C: Classifier> {
    model: C,
    labels: DiseaseLabelSpace,
    n_features: usize,
}

impl<C: Classifier> ClassifierAdapter<C> {
    /// Bind `model` to a vocabulary and label space.
    ///
    /// # Errors
    /// - `ConfigError::ModelMismatch` if the model's feature count differs from
    ///   the vocabulary size
    /// - `ConfigError::InvalidModel` if embedded feature names or class names
    ///   disagree with the vocabulary or label space, or the class count differs
    pub fn new(
        model: C,
        vocabulary: &SymptomVocabulary,
        labels: &DiseaseLabelSpace,
    ) -> Result<Self, ConfigError> {
        if model.n_features() != vocabulary.len() {
            return Err(ConfigError::ModelMismatch {
                expected: model.n_features(),
                actual: vocabulary.len(),
            });
        }

        if let Some(names) = model.feature_names() {
            if let Some(pos) = names
                .iter()
                .zip(vocabulary.names())
                .position(|(model_name, vocab_name)| model_name != vocab_name)
            {
                return Err(ConfigError::InvalidModel(format!(
                    "feature {pos} is {:?} in the model but {:?} in the vocabulary",
                    names[pos],
                    vocabulary.names()[pos]
                )));
            }
        }

        if model.n_classes() != labels.len() {
            return Err(ConfigError::InvalidModel(format!(
                "model has {} classes, label space has {}",
                model.n_classes(),
                labels.len()
            )));
        }

        if let Some(classes) = model.class_names() {
            if classes != labels.names() {
                return Err(ConfigError::InvalidModel(
                    "model classes differ from the training labels".to_string(),
                ));
            }
        }

        tracing::info!(
            "Classifier bound: {} features, {} classes",
            vocabulary.len(),
            labels.len()
        );

        Ok(Self {
            model,
            labels: labels.clone(),
            n_features: vocabulary.len(),
        })
    }

    /// Predict a disease name for an encoded symptom vector.
    ///
    /// # Errors
    /// A wrong vector length or a class id outside the label space is a
    /// configuration error, never recovered.
    pub fn predict(&self, features: &FeatureVector) -> Result<String, ConfigError> {
        let id = self.model.predict(features).map_err(|e| match e {
            ModelError::DimensionMismatch { expected, actual } => {
                ConfigError::ModelMismatch { expected, actual }
            }
            ModelError::NoClasses => ConfigError::InvalidModel(e.to_string()),
        })?;

        self.labels
            .name(id)
            .map(str::to_string)
            .ok_or(ConfigError::UnknownClass(id.0))
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn model(&self) -> &C {
        &self.model
    }
}
