//! Recommendation service: the per-request prediction pipeline.
//!
//! encode → classify → resolve → record → count, one blocking call per
//! request. The advisory is built before the history collaborator is
//! touched, so a storage outage degrades the outcome instead of failing it.

use std::sync::Arc;

use serde::Serialize;

use super::classifier::ClassifierAdapter;
use super::enrichment;
use super::knowledge::KnowledgeBase;
use crate::adapters::StorageError;
use crate::domain::{
    AdvisoryRecord, HistoryEntry, HistoryPage, RepeatAlert, Session, NEARBY_HOSPITALS_URL,
};
use crate::ports::{Classifier, HistoryRecorder};
use crate::{MedirecError, Result};

/// Whether the current prediction reached the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HistoryStatus {
    Recorded,
    Failed { reason: String },
}

/// Everything produced for one prediction request.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub disease: String,
    pub advisory: AdvisoryRecord,
    /// Submitted names outside the vocabulary; they did not affect the prediction.
    pub ignored_symptoms: Vec<String>,
    pub history: HistoryStatus,
    /// Predictions of this disease for the user, including this one.
    /// `None` when the history store could not be read.
    pub occurrences: Option<usize>,
    pub repeat_alert: Option<RepeatAlert>,
    pub hospital_search_url: String,
}

/// Orchestrates a prediction for an authenticated session.
pub struct RecommendationService<C, H>
where
    C: Classifier,
    H: HistoryRecorder,
{
    knowledge: Arc<KnowledgeBase>,
    classifier: ClassifierAdapter<C>,
    history: Arc<H>,
}

impl<C, H> RecommendationService<C, H>
where
    C: Classifier,
    H: HistoryRecorder,
    H::Error: Into<StorageError>,
{
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        classifier: ClassifierAdapter<C>,
        history: Arc<H>,
    ) -> Self {
        Self {
            knowledge,
            classifier,
            history,
        }
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    fn user_id(session: &Session) -> Result<&str> {
        session.user_id().ok_or(MedirecError::Unauthenticated)
    }

    /// Predict a disease from a symptom selection and enrich it.
    ///
    /// # Errors
    /// - `MedirecError::Unauthenticated` without a logged-in user
    /// - `MedirecError::Config` on a model/vocabulary mismatch
    ///
    /// History failures are reported inside the outcome, not as errors.
    pub fn predict(&self, session: &Session, symptoms: &[String]) -> Result<PredictionOutcome> {
        let user_id = Self::user_id(session)?;
        let vocabulary = self.knowledge.vocabulary();

        tracing::debug!("Step 1: Encoding {} selected symptoms...", symptoms.len());
        let ignored_symptoms = vocabulary.unrecognized(symptoms);
        if !ignored_symptoms.is_empty() {
            tracing::warn!(
                "Ignoring {} symptom name(s) outside the vocabulary: {:?}",
                ignored_symptoms.len(),
                ignored_symptoms
            );
        }
        let features = vocabulary.encode(symptoms);

        tracing::debug!("Step 2: Classifying {} recognized symptoms...", features.ones());
        let disease = self.classifier.predict(&features)?;

        tracing::debug!("Step 3: Resolving advisory for {:?}...", disease);
        let advisory = enrichment::resolve(&disease, self.knowledge.catalog());

        tracing::debug!("Step 4: Recording prediction...");
        let entry = HistoryEntry::new(user_id, symptoms.to_vec(), disease.clone());
        let history = match self.history.record(&entry) {
            Ok(()) => HistoryStatus::Recorded,
            Err(e) => {
                let e: StorageError = e.into();
                tracing::warn!("Failed to record prediction: {}", e);
                HistoryStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        tracing::debug!("Step 5: Counting prior matches...");
        let occurrences = match self.history.count_prior_matches(user_id, &disease) {
            Ok(stored) => Some(match history {
                HistoryStatus::Recorded => stored,
                HistoryStatus::Failed { .. } => stored + 1,
            }),
            Err(e) => {
                let e: StorageError = e.into();
                tracing::warn!("Failed to count prior predictions: {}", e);
                None
            }
        };
        let repeat_alert = occurrences.and_then(|n| RepeatAlert::evaluate(&disease, n));
        if repeat_alert.is_some() {
            tracing::info!("Repeat alert raised for {:?}", disease);
        }

        tracing::info!("Prediction complete: disease={:?}", disease);

        Ok(PredictionOutcome {
            disease,
            advisory,
            ignored_symptoms,
            history,
            occurrences,
            repeat_alert,
            hospital_search_url: NEARBY_HOSPITALS_URL.to_string(),
        })
    }

    /// One page of the session user's history, newest first.
    ///
    /// # Errors
    /// Returns `Unauthenticated` or a storage error.
    pub fn history_page(
        &self,
        session: &Session,
        offset: usize,
        limit: usize,
    ) -> Result<HistoryPage> {
        let user_id = Self::user_id(session)?;
        self.history
            .load_history_paginated(user_id, offset, limit)
            .map_err(|e| MedirecError::Storage(e.into()))
    }
}
