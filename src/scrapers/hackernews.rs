//! Hacker News front page via the Algolia search API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::feed::{strip_html, truncate_chars};
use super::http::{endpoint, HttpSession};
use super::{decode_item, require_text, Scraper, ScraperError};
use crate::config::{HackerNewsConfig, HttpConfig};
use crate::intel::types::{IntelligenceRecord, Source};

const STORY_TEXT_EXCERPT: usize = 500;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    points: Option<f64>,
    num_comments: Option<u64>,
    story_text: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

pub struct HackerNewsScraper {
    config: HackerNewsConfig,
    session: HttpSession,
}

impl HackerNewsScraper {
    pub fn new(config: HackerNewsConfig, http: HttpConfig) -> Self {
        Self {
            config,
            session: HttpSession::new(Source::Hackernews, http),
        }
    }

    pub fn config(&self) -> &HackerNewsConfig {
        &self.config
    }
}

#[async_trait]
impl Scraper for HackerNewsScraper {
    fn source(&self) -> Source {
        Source::Hackernews
    }

    fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError> {
        let url = endpoint(
            Source::Hackernews,
            &self.config.base_url,
            "search",
            &[
                ("tags", "front_page".into()),
                ("hitsPerPage", self.config.max_results.to_string()),
                ("numericFilters", format!("points>={}", self.config.min_points)),
            ],
        )?;
        let response: SearchResponse = self
            .session
            .fetch_json("Hacker News search", |client| client.get(url.clone()))
            .await?;
        tracing::debug!(count = response.hits.len(), "fetched front page stories");
        Ok(response
            .hits
            .into_iter()
            .take(self.config.max_results)
            .collect())
    }

    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError> {
        let hit: Hit = decode_item(Source::Hackernews, raw)?;
        let id = require_text("objectID", hit.object_id.as_deref())?;
        let title = require_text("title", hit.title.as_deref())?;

        // Ask HN and similar posts have no outbound link
        let url = match hit.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("https://news.ycombinator.com/item?id={id}"),
        };

        let mut summary = format!(
            "{} points · {} comments",
            hit.points.unwrap_or(0.0),
            hit.num_comments.unwrap_or(0)
        );
        if let Some(author) = hit.author.as_deref() {
            summary.push_str(&format!(" · by {author}"));
        }
        if let Some(text) = hit.story_text.as_deref() {
            let text = strip_html(text);
            if !text.is_empty() {
                summary.push_str(" · ");
                summary.push_str(&truncate_chars(&text, STORY_TEXT_EXCERPT));
            }
        }

        Ok(IntelligenceRecord {
            source: Source::Hackernews,
            external_id: id,
            title,
            url,
            summary,
            score: hit.points,
            published_at: hit.created_at,
            fetched_at,
            raw_payload: raw.clone(),
        })
    }
}
