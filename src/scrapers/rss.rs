//! Generic RSS 2.0 / Atom feed collector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::feed::{parse_feed, parse_feed_date, FeedEntry};
use super::http::HttpSession;
use super::{decode_item, require_text, Scraper, ScraperError};
use crate::config::{HttpConfig, RssConfig};
use crate::intel::types::{IntelligenceRecord, Source};

/// Raw RSS item: the entry plus the feed it came from.
#[derive(Debug, Serialize, Deserialize)]
struct FeedItem {
    feed: String,
    entry: FeedEntry,
}

pub struct RssScraper {
    config: RssConfig,
    session: HttpSession,
}

impl RssScraper {
    pub fn new(config: RssConfig, http: HttpConfig) -> Self {
        Self {
            config,
            session: HttpSession::new(Source::Rss, http),
        }
    }

    pub fn config(&self) -> &RssConfig {
        &self.config
    }
}

#[async_trait]
impl Scraper for RssScraper {
    fn source(&self) -> Source {
        Source::Rss
    }

    fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError> {
        let mut items = Vec::new();
        for feed in &self.config.feeds {
            let url = reqwest::Url::parse(feed).map_err(|e| ScraperError::Configuration {
                upstream: Source::Rss,
                message: format!("invalid feed url {feed:?}: {e}"),
            })?;
            let body = self.session.fetch_text(|client| client.get(url.clone())).await?;
            let entries = parse_feed(&body)?;
            tracing::debug!(feed = %feed, count = entries.len(), "parsed feed");

            for entry in entries.into_iter().take(self.config.max_per_feed) {
                let item = FeedItem {
                    feed: feed.clone(),
                    entry,
                };
                items.push(serde_json::to_value(item).map_err(|source| {
                    ScraperError::Parse {
                        context: "feed entry".into(),
                        source,
                    }
                })?);
            }
        }
        Ok(items)
    }

    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError> {
        let FeedItem { feed, entry } = decode_item(Source::Rss, raw)?;
        let title = require_text("title", Some(&entry.title))?;
        let link = entry.link.clone().filter(|l| !l.trim().is_empty());
        let external_id = require_text("id or link", entry.id.as_deref().or(link.as_deref()))?;

        let mut summary = entry.summary.clone();
        if summary.is_empty() {
            summary = format!("via {feed}");
        }

        Ok(IntelligenceRecord {
            source: Source::Rss,
            url: link.unwrap_or_else(|| external_id.clone()),
            external_id,
            title,
            summary,
            score: None,
            published_at: entry
                .published
                .as_deref()
                .or(entry.updated.as_deref())
                .and_then(parse_feed_date),
            fetched_at,
            raw_payload: raw.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> RssScraper {
        RssScraper::new(RssConfig::default(), HttpConfig::default())
    }

    fn item(entry: FeedEntry) -> Value {
        serde_json::to_value(FeedItem {
            feed: "https://example.com/feed".into(),
            entry,
        })
        .unwrap()
    }

    #[test]
    fn guid_preferred_over_link() {
        let raw = item(FeedEntry {
            id: Some("urn:post:101".into()),
            title: "Hello".into(),
            link: Some("https://example.com/hello".into()),
            summary: "First post.".into(),
            published: Some("Tue, 10 Mar 2026 14:30:00 +0000".into()),
            ..Default::default()
        });
        let record = scraper().normalize(&raw, Utc::now()).unwrap();
        assert_eq!(record.external_id, "urn:post:101");
        assert_eq!(record.url, "https://example.com/hello");
        assert!(record.published_at.is_some());
    }

    #[test]
    fn link_used_when_guid_missing() {
        let raw = item(FeedEntry {
            title: "Hello".into(),
            link: Some("https://example.com/hello".into()),
            ..Default::default()
        });
        let record = scraper().normalize(&raw, Utc::now()).unwrap();
        assert_eq!(record.external_id, "https://example.com/hello");
        assert_eq!(record.summary, "via https://example.com/feed");
    }

    #[test]
    fn entry_without_identity_fails() {
        let raw = item(FeedEntry {
            title: "Orphan".into(),
            ..Default::default()
        });
        assert!(scraper().normalize(&raw, Utc::now()).is_err());
    }
}
