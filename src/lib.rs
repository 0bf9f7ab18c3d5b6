//! # Medirec
//!
//! Symptom-based disease prediction enriched with descriptive, precautionary,
//! medicinal, dietary and activity guidance.
//!
//! This crate provides:
//! - Symptom encoding into a fixed-order binary feature vector
//! - Classification through a pre-trained model artifact
//! - Enrichment of the predicted disease from static reference tables
//! - Per-user prediction history with a repeat-occurrence alert
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (vocabulary, label space, catalog, advisory records)
//! - `ports`: Trait definitions for the classifier and the storage collaborators
//! - `adapters`: Concrete implementations (CSV tables, model artifacts, SQLite)
//! - `application`: Use cases orchestrating domain and ports
//! - `shell`: Line-oriented front end used by the `medirec` binary

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod shell;

use std::path::PathBuf;

pub use domain::{AdvisoryRecord, FeatureVector, HistoryEntry, RepeatAlert, Session};

/// Result type for Medirec operations
pub type Result<T> = std::result::Result<T, MedirecError>;

/// Fatal configuration errors.
///
/// These abort startup: the process cannot serve predictions with an
/// inconsistent model, vocabulary or reference data.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Malformed table {}: {reason}", .path.display())]
    MalformedTable { path: PathBuf, reason: String },

    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    #[error("Duplicate symptom column: {0}")]
    DuplicateSymptom(String),

    #[error("Model expects {expected} features but vocabulary has {actual}")]
    ModelMismatch { expected: usize, actual: usize },

    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("Model signature verification failed: {0}")]
    Signature(String),

    #[error("Classifier emitted unknown class id {0}")]
    UnknownClass(usize),
}

/// Main error type for Medirec
#[derive(Debug, thiserror::Error)]
pub enum MedirecError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Not logged in")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
