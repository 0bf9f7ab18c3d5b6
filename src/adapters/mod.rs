//! Adapters layer: Concrete implementations of ports.
//!
//! - `tables`: CSV loading for the training and reference tables
//! - `model`: linear and exemplar classifiers, model signature checks
//! - `sqlite`: SQLite for history and accounts
//! - `sanitize`: credential filtering for logs

pub mod model;
pub mod sanitize;
pub mod sqlite;
pub mod tables;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
