//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! Everything loaded at startup is immutable afterwards and safe to share
//! across threads without locking.

mod advisory;
mod alert;
pub mod catalog;
mod history;
pub mod list_literal;
pub mod password;
mod session;
mod training;
mod vocabulary;

pub use advisory::{AdvisoryRecord, DEFAULT_DESCRIPTION};
pub use alert::{RepeatAlert, NEARBY_HOSPITALS_URL, REPEAT_ALERT_THRESHOLD};
pub use catalog::{ReferenceCatalog, ReferenceRow, ReferenceTable, TableKind};
pub use history::{HistoryEntry, HistoryPage};
pub use session::Session;
pub use training::{TrainingRow, TrainingTable};
pub use vocabulary::{ClassId, DiseaseLabelSpace, FeatureVector, SymptomVocabulary};
