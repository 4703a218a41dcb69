use chrono::Utc;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::domain::{FeedDocument, FeedEntry};
use crate::fetcher::FetchError;

/// Parses RSS 0.9x/1.0/2.0, Atom and JSON Feed documents into a
/// [`FeedDocument`], preserving the feed's own entry order.
///
/// feed-rs would otherwise invent ids for entries without one (a link hash,
/// or a fresh UUID on every parse). Those ids are left blank here so the
/// link fallback and the malformed-entry skip in [`FeedEntry::identify`]
/// apply, and cursors stay stable across fetches.
#[derive(Clone, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &[u8]) -> Result<FeedDocument, FetchError> {
        let feed = parser::Builder::new()
            .id_generator(|_links, _title, _uri| String::new())
            .build()
            .parse(body)
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let title = feed.title.map(|t| decode_html_entities(&t.content).to_string());

        let mut entries = Vec::with_capacity(feed.entries.len());
        for entry in feed.entries {
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .unwrap_or_default();

            let Some(id) = FeedEntry::identify(&entry.id, &link) else {
                tracing::warn!("Skipping feed entry with neither id nor link");
                continue;
            };

            // Full content wins over the summary, as long as it is not blank.
            let body = entry
                .content
                .and_then(|c| c.body)
                .filter(|b| !b.trim().is_empty())
                .or_else(|| {
                    entry
                        .summary
                        .map(|s| s.content)
                        .filter(|s| !s.trim().is_empty())
                });

            entries.push(FeedEntry {
                id,
                title: entry
                    .title
                    .map(|t| decode_html_entities(&t.content).trim().to_string())
                    .unwrap_or_default(),
                link,
                body,
                published_at: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc)),
            });
        }

        Ok(FeedDocument { title, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <description>A test feed</description>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <guid>  item-2  </guid>
      <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
      <description>&lt;p&gt;This is &lt;b&gt;item&lt;/b&gt; 2&lt;/p&gt;</description>
    </item>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>Summary only</summary>
    <content type="html">&lt;i&gt;Full content&lt;/i&gt;</content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_keeps_feed_order() {
        let doc = FeedParser::new().parse(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.title, Some("Test Feed".into()));
        let ids: Vec<_> = doc.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["item-2", "item-1"]);
        assert_eq!(doc.entries[0].title, "Test Item 2");
        assert_eq!(doc.entries[0].link, "https://example.com/item2");
    }

    #[test]
    fn test_parse_rss_body_and_dates() {
        let doc = FeedParser::new().parse(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(
            doc.entries[0].body.as_deref(),
            Some("<p>This is <b>item</b> 2</p>")
        );
        assert_eq!(doc.entries[1].body, None);
        assert_eq!(
            doc.entries[1].published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_atom_prefers_content() {
        let doc = FeedParser::new().parse(ATOM_SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.entries[0].id, "atom-entry-1");
        assert_eq!(doc.entries[0].body.as_deref(), Some("<i>Full content</i>"));
        assert_eq!(
            doc.entries[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    const RSS_WITHOUT_GUIDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>No Guids</title>
    <item>
      <title>Linked only</title>
      <link>https://example.com/post-1</link>
    </item>
    <item>
      <title>Neither id nor link</title>
      <description>orphan</description>
    </item>
    <item>
      <title>With guid</title>
      <link>https://example.com/post-2</link>
      <guid>post-2</guid>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_entry_without_guid_uses_link() {
        let doc = FeedParser::new().parse(RSS_WITHOUT_GUIDS.as_bytes()).unwrap();

        assert_eq!(doc.entries[0].id, "https://example.com/post-1");
        assert_eq!(doc.entries[0].link, "https://example.com/post-1");
    }

    #[test]
    fn test_entry_without_id_or_link_skipped() {
        let doc = FeedParser::new().parse(RSS_WITHOUT_GUIDS.as_bytes()).unwrap();

        let ids: Vec<_> = doc.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["https://example.com/post-1", "post-2"]);
    }

    #[test]
    fn test_ids_stable_across_parses() {
        let parser = FeedParser::new();
        let first = parser.parse(RSS_WITHOUT_GUIDS.as_bytes()).unwrap();
        let second = parser.parse(RSS_WITHOUT_GUIDS.as_bytes()).unwrap();

        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn test_parse_invalid_document() {
        let err = FeedParser::new().parse(b"not a feed").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
