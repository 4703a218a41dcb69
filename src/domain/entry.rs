use chrono::{DateTime, Utc};

/// A parsed feed document, entries in the order the feed listed them.
#[derive(Debug, Clone, Default)]
pub struct FeedDocument {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// A single feed entry as the feed provided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Trimmed entry id; the entry link when the feed gave no id.
    pub id: String,
    pub title: String,
    pub link: String,
    /// Raw markup body, if the feed carried one.
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.trim().to_string(),
            title: String::new(),
            link: String::new(),
            body: None,
            published_at: None,
        }
    }

    /// Picks the identifier used for cursor comparison: the trimmed raw id,
    /// falling back to the trimmed link. `None` when both are blank.
    pub fn identify(raw_id: &str, link: &str) -> Option<String> {
        [raw_id, link]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from)
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = link.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}
