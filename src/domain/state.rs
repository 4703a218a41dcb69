use serde::{Deserialize, Serialize};

/// Persisted cross-run state: conditional-fetch validators plus the delivery
/// cursor.
///
/// The on-disk shape is `{"etag": .., "modified": .., "last_entry_id": ..}`.
/// Missing keys deserialize as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryState {
    /// Entity tag from the last successful fetch.
    pub etag: Option<String>,
    /// `Last-Modified` value from the last successful fetch.
    pub modified: Option<String>,
    /// Id of the most recently delivered entry.
    pub last_entry_id: Option<String>,
}

impl DeliveryState {
    /// True when no entry has ever been delivered or seeded.
    pub fn is_cold(&self) -> bool {
        self.last_entry_id.is_none()
    }

    /// Trims every field and turns blank values into `None`.
    pub fn normalized(self) -> Self {
        Self {
            etag: non_blank(self.etag),
            modified: non_blank(self.modified),
            last_entry_id: non_blank(self.last_entry_id),
        }
    }

    /// Replaces both validators. A validator the server did not send is cleared.
    pub fn set_validators(&mut self, etag: Option<String>, modified: Option<String>) {
        self.etag = non_blank(etag);
        self.modified = non_blank(modified);
    }

    pub fn advance_to(&mut self, entry_id: &str) {
        self.last_entry_id = Some(entry_id.to_string());
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
