//! History port: Trait for the prediction history collaborator.
//!
//! The application assumes durable append and a consistent count read;
//! concurrency control belongs to the implementation.

use crate::domain::{HistoryEntry, HistoryPage};

/// Trait for prediction history storage.
pub trait HistoryRecorder: Send + Sync {
    /// Error type for history operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append a prediction to the history.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn record(&self, entry: &HistoryEntry) -> Result<(), Self::Error>;

    /// Count recorded predictions of `disease` for `user_id`.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_prior_matches(&self, user_id: &str, disease: &str) -> Result<usize, Self::Error>;

    /// Load a user's history with pagination, newest first.
    ///
    /// # Arguments
    /// * `offset` - Starting position (0-indexed)
    /// * `limit` - Maximum number of items to return
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_history_paginated(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<HistoryPage, Self::Error>;
}
