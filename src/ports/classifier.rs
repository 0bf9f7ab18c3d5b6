//! Classifier port: the pre-trained model as a black box.
//!
//! Model internals are out of scope. A classifier takes a fixed-length
//! feature vector and returns one class id.

use crate::domain::{ClassId, FeatureVector};

/// Errors raised by a classifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Feature vector has {actual} entries, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model has no classes")]
    NoClasses,
}

/// Trait for a multi-class classifier.
pub trait Classifier: Send + Sync {
    /// Feature vector length the model was trained with.
    fn n_features(&self) -> usize;

    /// Number of classes the model can emit.
    fn n_classes(&self) -> usize;

    /// Optional class names embedded in the model artifact, ordered by id.
    fn class_names(&self) -> Option<&[String]> {
        None
    }

    /// Optional feature names embedded in the model artifact, in feature order.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict the class of a feature vector.
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` if the vector length differs
    /// from `n_features()`.
    fn predict(&self, features: &FeatureVector) -> Result<ClassId, ModelError>;
}
