//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the pre-trained model and the storage
//! collaborators (history, accounts).

mod accounts;
mod classifier;
mod history;

pub use accounts::{AccountStore, Registration};
pub use classifier::{Classifier, ModelError};
pub use history::HistoryRecorder;
