pub mod sanitizer;

use crate::domain::{FeedEntry, NotificationMessage, NO_DESCRIPTION};

pub use sanitizer::{AmmoniaSanitizer, ALLOWED_TAGS};

/// Restricts markup to a fixed tag set, keeping the text of removed elements.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, markup: &str) -> String;
}

/// Builds the message for one entry. Title and link are trimmed but otherwise
/// untouched; escaping happens when the message is rendered.
pub fn normalize(entry: &FeedEntry, sanitizer: &dyn Sanitizer) -> NotificationMessage {
    let body = entry
        .body
        .as_deref()
        .map(|raw| sanitizer.sanitize(raw).trim().to_string())
        .filter(|clean| !clean.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    NotificationMessage {
        entry_id: entry.id.clone(),
        title: entry.title.trim().to_string(),
        link: entry.link.trim().to_string(),
        body,
    }
}
