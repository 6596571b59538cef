//! arXiv export API collector (Atom feed).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::feed::{parse_feed, parse_feed_date, FeedEntry};
use super::http::{endpoint, HttpSession};
use super::{decode_item, require_text, Scraper, ScraperError};
use crate::config::{ArxivConfig, HttpConfig};
use crate::intel::types::{IntelligenceRecord, Source};

pub struct ArxivScraper {
    config: ArxivConfig,
    session: HttpSession,
}

impl ArxivScraper {
    pub fn new(config: ArxivConfig, http: HttpConfig) -> Self {
        Self {
            config,
            session: HttpSession::new(Source::Arxiv, http),
        }
    }

    pub fn config(&self) -> &ArxivConfig {
        &self.config
    }

    /// `cat:cs.AI OR cat:cs.LG ...`
    fn search_query(&self) -> String {
        self.config
            .categories
            .iter()
            .map(|c| format!("cat:{c}"))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

/// `http://arxiv.org/abs/2403.01234v2` → `2403.01234`, so new revisions of a
/// paper are recognised as the same item.
fn paper_id(entry_id: &str) -> String {
    let tail = entry_id
        .rsplit_once("/abs/")
        .map_or(entry_id, |(_, tail)| tail);
    match tail.rfind('v') {
        Some(pos)
            if pos > 0
                && pos + 1 < tail.len()
                && tail[pos + 1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            tail[..pos].to_string()
        }
        _ => tail.to_string(),
    }
}

#[async_trait]
impl Scraper for ArxivScraper {
    fn source(&self) -> Source {
        Source::Arxiv
    }

    fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError> {
        if self.config.categories.is_empty() {
            return Ok(Vec::new());
        }
        let url = endpoint(
            Source::Arxiv,
            &self.config.base_url,
            "",
            &[
                ("search_query", self.search_query()),
                ("sortBy", "submittedDate".into()),
                ("sortOrder", "descending".into()),
                ("start", "0".into()),
                ("max_results", self.config.max_results.to_string()),
            ],
        )?;

        let body = self.session.fetch_text(|client| client.get(url.clone())).await?;
        let entries = parse_feed(&body)?;
        tracing::debug!(count = entries.len(), "parsed arXiv entries");

        entries
            .into_iter()
            .take(self.config.max_results)
            .map(|entry| {
                serde_json::to_value(entry).map_err(|source| ScraperError::Parse {
                    context: "arXiv entry".into(),
                    source,
                })
            })
            .collect()
    }

    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError> {
        let entry: FeedEntry = decode_item(Source::Arxiv, raw)?;
        let entry_id = require_text("id", entry.id.as_deref())?;
        let title = require_text("title", Some(&entry.title))?;

        let mut summary = entry.summary.clone();
        if !entry.authors.is_empty() {
            summary = format!("{}: {}", entry.authors.join(", "), summary);
        }

        Ok(IntelligenceRecord {
            source: Source::Arxiv,
            external_id: paper_id(&entry_id),
            title,
            url: entry.link.clone().unwrap_or(entry_id),
            summary,
            score: None,
            published_at: entry.published.as_deref().and_then(parse_feed_date),
            fetched_at,
            raw_payload: raw.clone(),
        })
    }
}
