pub mod http_fetcher;

use async_trait::async_trait;

use crate::domain::{DeliveryState, FeedDocument};
use crate::parser::FeedParser;

pub use http_fetcher::HttpFetcher;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Feed parsing error: {0}")]
    Parse(String),
}

#[derive(Debug)]
pub enum FetchResult {
    /// New content fetched successfully
    Content {
        body: Vec<u8>,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// Content not modified (HTTP 304)
    NotModified,
}

/// Raw conditional retrieval of a feed document.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Validators are only sent when present and non-empty.
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResult, FetchError>;
}

/// Outcome of a conditional fetch, document already parsed.
#[derive(Debug)]
pub enum FetchOutcome {
    NotModified,
    Modified {
        document: FeedDocument,
        etag: Option<String>,
        last_modified: Option<String>,
    },
}

/// Drives a [`Fetcher`] with the validators held in [`DeliveryState`] and
/// parses whatever comes back.
pub struct ConditionalFetcher<'a> {
    fetcher: &'a dyn Fetcher,
    parser: FeedParser,
}

impl<'a> ConditionalFetcher<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            parser: FeedParser::new(),
        }
    }

    pub async fn fetch(&self, url: &str, state: &DeliveryState) -> Result<FetchOutcome, FetchError> {
        tracing::debug!(
            "Fetching {} (etag: {:?}, modified: {:?})",
            url,
            state.etag,
            state.modified
        );

        let result = self
            .fetcher
            .fetch(url, state.etag.as_deref(), state.modified.as_deref())
            .await?;

        match result {
            FetchResult::NotModified => Ok(FetchOutcome::NotModified),
            FetchResult::Content {
                body,
                etag,
                last_modified,
            } => {
                let document = self.parser.parse(&body)?;
                tracing::debug!(
                    "Fetched {} entries (etag: {:?}, modified: {:?})",
                    document.entries.len(),
                    etag,
                    last_modified
                );
                Ok(FetchOutcome::Modified {
                    document,
                    etag,
                    last_modified,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetcher, RSS_ABC};

    #[tokio::test]
    async fn test_passes_state_validators() {
        let fetcher = FakeFetcher::not_modified();
        let state = DeliveryState {
            etag: Some("\"v1\"".into()),
            modified: Some("Mon, 01 Jan 2024 00:00:00 GMT".into()),
            last_entry_id: None,
        };

        let outcome = ConditionalFetcher::new(&fetcher)
            .fetch("https://example.com/feed.xml", &state)
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::NotModified));
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_deref(), Some("\"v1\""));
        assert_eq!(calls[0].1.as_deref(), Some("Mon, 01 Jan 2024 00:00:00 GMT"));
    }

    #[tokio::test]
    async fn test_parses_modified_document() {
        let fetcher = FakeFetcher::content(RSS_ABC, Some("\"v2\""), None);

        let outcome = ConditionalFetcher::new(&fetcher)
            .fetch("https://example.com/feed.xml", &DeliveryState::default())
            .await
            .unwrap();

        match outcome {
            FetchOutcome::Modified {
                document,
                etag,
                last_modified,
            } => {
                assert_eq!(document.entries.len(), 3);
                assert_eq!(etag.as_deref(), Some("\"v2\""));
                assert!(last_modified.is_none());
            }
            FetchOutcome::NotModified => panic!("expected content"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body_is_fetch_error() {
        let fetcher = FakeFetcher::content("this is not a feed", None, None);

        let err = ConditionalFetcher::new(&fetcher)
            .fetch("https://example.com/feed.xml", &DeliveryState::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Parse(_)));
    }
}
