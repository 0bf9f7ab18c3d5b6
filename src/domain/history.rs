//! Prediction history types.
//!
//! Entries are written once per successful prediction and never mutated.

use serde::{Deserialize, Serialize};

/// One recorded prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier
    pub id: String,

    /// User the prediction was made for
    pub user_id: String,

    /// Symptom selection as submitted
    pub symptoms: Vec<String>,

    /// Predicted disease name
    pub disease: String,

    /// Timestamp of the prediction
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl HistoryEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        symptoms: Vec<String>,
        disease: impl Into<String>,
    ) -> Self {
        Self::at(user_id, symptoms, disease, chrono::Utc::now())
    }

    /// Create an entry with an explicit timestamp.
    #[must_use]
    pub fn at(
        user_id: impl Into<String>,
        symptoms: Vec<String>,
        disease: impl Into<String>,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: uuid_v4(),
            user_id: user_id.into(),
            symptoms,
            disease: disease.into(),
            created_at,
        }
    }
}

/// A page of history entries with pagination metadata.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    /// Entries in this page, newest first
    pub items: Vec<HistoryEntry>,
    /// Total number of entries for the user
    pub total_count: usize,
    /// Current page offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
    /// Whether there are more pages
    pub has_more: bool,
}

impl HistoryPage {
    #[must_use]
    pub fn new(items: Vec<HistoryEntry>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        if self.has_more {
            Some(self.offset + self.limit)
        } else {
            None
        }
    }

    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        if self.offset > 0 {
            Some(self.offset.saturating_sub(self.limit))
        } else {
            None
        }
    }
}

/// Generate a random UUID v4 string.
///
/// Seeded from OS entropy so ids cannot be predicted from earlier ones.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = HistoryEntry::new("alice", vec!["itching".into()], "Fungal infection");
        assert_eq!(entry.user_id, "alice");
        assert_eq!(entry.disease, "Fungal infection");
        assert_eq!(entry.symptoms, vec!["itching"]);
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
        assert_eq!(&id1[14..15], "4");
    }

    #[test]
    fn test_page_offsets() {
        let items: Vec<HistoryEntry> = (0..2)
            .map(|_| HistoryEntry::new("bob", Vec::new(), "GERD"))
            .collect();
        let page = HistoryPage::new(items, 5, 2, 2);
        assert!(page.has_more);
        assert_eq!(page.next_offset(), Some(4));
        assert_eq!(page.prev_offset(), Some(0));

        let last = HistoryPage::new(vec![HistoryEntry::new("bob", Vec::new(), "GERD")], 5, 4, 2);
        assert!(!last.has_more);
        assert_eq!(last.next_offset(), None);
    }
}
