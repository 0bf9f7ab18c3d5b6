//! Advisory record: the guidance bundle produced for one predicted disease.

use serde::{Deserialize, Serialize};

/// Description shown when the description table has no row for a disease.
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// Enriched guidance for one prediction.
///
/// Every field has a default used when the matching reference table has no
/// row for the disease. Built per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryRecord {
    pub description: String,
    pub precautions: Vec<String>,
    pub symptoms: Vec<String>,
    pub medications: Vec<String>,
    pub diet: Vec<String>,
    pub workout: Vec<String>,
}

impl Default for AdvisoryRecord {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            precautions: Vec::new(),
            symptoms: Vec::new(),
            medications: Vec::new(),
            diet: Vec::new(),
            workout: Vec::new(),
        }
    }
}
