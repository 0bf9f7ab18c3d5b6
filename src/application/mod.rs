//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod accounts;
mod classifier;
pub mod enrichment;
mod knowledge;
mod recommendation;
mod services;

pub use accounts::AccountService;
pub use classifier::ClassifierAdapter;
pub use knowledge::KnowledgeBase;
pub use recommendation::{HistoryStatus, PredictionOutcome, RecommendationService};
pub use services::Services;
