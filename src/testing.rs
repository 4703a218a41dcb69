//! Fakes shared by the unit tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::delivery::{DeliveryError, Transport};
use crate::fetcher::{FetchError, FetchResult, Fetcher};
use crate::resolver::ColdStartPolicy;

/// Three entries a -> b -> c, listed newest first.
pub const RSS_ABC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>ABC</title>
    <item>
      <title>Entry C</title>
      <link>https://example.com/c</link>
      <guid>c</guid>
      <pubDate>Wed, 03 Jan 2024 00:00:00 GMT</pubDate>
      <description>Body &lt;b&gt;c&lt;/b&gt;</description>
    </item>
    <item>
      <title>Entry B</title>
      <link>https://example.com/b</link>
      <guid>b</guid>
      <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
      <description>Body &lt;b&gt;b&lt;/b&gt;</description>
    </item>
    <item>
      <title>Entry A</title>
      <link>https://example.com/a</link>
      <guid>a</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>Body &lt;b&gt;a&lt;/b&gt;</description>
    </item>
  </channel>
</rss>"#;

pub fn test_config() -> AppConfig {
    AppConfig {
        feed_url: "https://example.com/feed.xml".into(),
        bot_token: "123:test".into(),
        chat_id: "@test-channel".into(),
        telegram_api_base: "https://api.telegram.org".into(),
        state_file: PathBuf::from("feed_cache.json"),
        fetch_timeout: Duration::from_secs(10),
        send_timeout: Duration::from_secs(10),
        cold_start: ColdStartPolicy::Seed,
        max_entries: None,
    }
}

enum FakeResponse {
    NotModified,
    Content {
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    Failing(Mutex<Option<FetchError>>),
}

/// Returns the same response on every call and records the validators sent.
pub struct FakeFetcher {
    response: FakeResponse,
    calls: Mutex<Vec<(Option<String>, Option<String>)>>,
}

impl FakeFetcher {
    fn with(response: FakeResponse) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn not_modified() -> Self {
        Self::with(FakeResponse::NotModified)
    }

    pub fn content(body: &str, etag: Option<&str>, last_modified: Option<&str>) -> Self {
        Self::with(FakeResponse::Content {
            body: body.to_string(),
            etag: etag.map(String::from),
            last_modified: last_modified.map(String::from),
        })
    }

    /// Fails the first call with `error`; later calls fail with a parse error.
    pub fn failing(error: FetchError) -> Self {
        Self::with(FakeResponse::Failing(Mutex::new(Some(error))))
    }

    pub fn calls(&self) -> Vec<(Option<String>, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(
        &self,
        _url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResult, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((etag.map(String::from), last_modified.map(String::from)));

        match &self.response {
            FakeResponse::NotModified => Ok(FetchResult::NotModified),
            FakeResponse::Content {
                body,
                etag,
                last_modified,
            } => Ok(FetchResult::Content {
                body: body.clone().into_bytes(),
                etag: etag.clone(),
                last_modified: last_modified.clone(),
            }),
            FakeResponse::Failing(error) => Err(error
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| FetchError::Parse("fake fetcher exhausted".into()))),
        }
    }
}

/// Records successful sends; fails sends matching a text fragment or an
/// attempt number.
pub struct FakeTransport {
    max_len: usize,
    fail_containing: Option<String>,
    fail_attempt: Option<usize>,
    attempts: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            max_len: 4096,
            fail_containing: None,
            fail_attempt: None,
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_containing = Some(fragment.to_string());
        self
    }

    /// Fails only the `attempt`-th send (zero-based) over the transport's life.
    pub fn failing_on_attempt(mut self, attempt: usize) -> Self {
        self.fail_attempt = Some(attempt);
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn max_message_len(&self) -> usize {
        self.max_len
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        let by_text = self
            .fail_containing
            .as_deref()
            .is_some_and(|fragment| text.contains(fragment));
        if by_text || self.fail_attempt == Some(attempt) {
            return Err(DeliveryError::Rejected {
                status: 500,
                description: "fake transport failure".into(),
            });
        }

        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}
