//! Repeat-occurrence alert.

use serde::{Deserialize, Serialize};

/// Number of predictions of the same disease for one user that raises the alert.
pub const REPEAT_ALERT_THRESHOLD: usize = 3;

/// Search link suggested alongside every prediction.
pub const NEARBY_HOSPITALS_URL: &str = "https://www.google.com/maps/search/hospitals+near+me";

const REPEAT_ALERT_URL: &str = "https://www.google.com/maps/search/nearby+hospitals";

/// Raised when a user has been predicted the same disease repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatAlert {
    pub disease: String,
    pub occurrences: usize,
    pub message: String,
    pub hospital_search_url: String,
}

impl RepeatAlert {
    /// Evaluate the repeat rule for a disease and its occurrence count,
    /// including the current prediction.
    #[must_use]
    pub fn evaluate(disease: &str, occurrences: usize) -> Option<Self> {
        if occurrences < REPEAT_ALERT_THRESHOLD {
            return None;
        }
        Some(Self {
            disease: disease.to_string(),
            occurrences,
            message: format!(
                "You've had this prediction {REPEAT_ALERT_THRESHOLD} or more times. Please consider visiting a doctor."
            ),
            hospital_search_url: REPEAT_ALERT_URL.to_string(),
        })
    }
}
