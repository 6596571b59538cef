//! Reddit collector using the public `top.json` subreddit listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::feed::truncate_chars;
use super::http::{endpoint, HttpSession};
use super::{decode_item, require_text, Scraper, ScraperError};
use crate::config::{HttpConfig, RedditConfig};
use crate::intel::types::{IntelligenceRecord, Source};

const SELFTEXT_EXCERPT: usize = 500;
const TIMEFRAMES: [&str; 6] = ["hour", "day", "week", "month", "year", "all"];

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Value,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: Option<String>,
    title: Option<String>,
    permalink: Option<String>,
    url: Option<String>,
    selftext: Option<String>,
    subreddit: Option<String>,
    score: Option<f64>,
    num_comments: Option<u64>,
    created_utc: Option<f64>,
}

pub struct RedditScraper {
    config: RedditConfig,
    session: HttpSession,
}

impl RedditScraper {
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] for an unknown `timeframe`.
    pub fn new(config: RedditConfig, http: HttpConfig) -> Result<Self, ScraperError> {
        if !TIMEFRAMES.contains(&config.timeframe.as_str()) {
            return Err(ScraperError::Configuration {
                upstream: Source::Reddit,
                message: format!(
                    "timeframe must be one of {}, got {:?}",
                    TIMEFRAMES.join("/"),
                    config.timeframe
                ),
            });
        }
        Ok(Self {
            config,
            session: HttpSession::new(Source::Reddit, http),
        })
    }

    pub fn config(&self) -> &RedditConfig {
        &self.config
    }
}

#[async_trait]
impl Scraper for RedditScraper {
    fn source(&self) -> Source {
        Source::Reddit
    }

    fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError> {
        let mut items = Vec::new();
        for subreddit in &self.config.subreddits {
            let url = endpoint(
                Source::Reddit,
                &self.config.base_url,
                &format!("r/{subreddit}/top.json"),
                &[
                    ("t", self.config.timeframe.clone()),
                    ("limit", self.config.limit.to_string()),
                    ("raw_json", "1".into()),
                ],
            )?;

            let listing: Listing = self
                .session
                .fetch_json("Reddit listing", |client| client.get(url.clone()))
                .await?;

            tracing::debug!(
                subreddit = %subreddit,
                count = listing.data.children.len(),
                "fetched subreddit listing"
            );
            items.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .take(self.config.limit)
                    .map(|child| child.data),
            );
        }
        Ok(items)
    }

    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError> {
        let post: Post = decode_item(Source::Reddit, raw)?;
        let id = require_text("id", post.id.as_deref())?;
        let title = require_text("title", post.title.as_deref())?;

        let url = match (post.permalink.as_deref(), post.url.as_deref()) {
            (Some(permalink), _) => format!("https://www.reddit.com{permalink}"),
            (None, Some(url)) => url.to_string(),
            (None, None) => return Err(ScraperError::Normalization("missing permalink".into())),
        };

        let mut summary = match post.selftext.as_deref() {
            Some(body) if !body.is_empty() && body != "[deleted]" && body != "[removed]" => {
                truncate_chars(body.trim(), SELFTEXT_EXCERPT)
            }
            _ => String::new(),
        };
        if let Some(sub) = post.subreddit.as_deref() {
            let comments = post.num_comments.unwrap_or(0);
            summary = if summary.is_empty() {
                format!("r/{sub} · {comments} comments")
            } else {
                format!("r/{sub} · {comments} comments · {summary}")
            };
        }

        Ok(IntelligenceRecord {
            source: Source::Reddit,
            external_id: id,
            title,
            url,
            summary,
            score: post.score,
            published_at: post
                .created_utc
                .and_then(|secs| DateTime::from_timestamp(secs as i64, 0)),
            fetched_at,
            raw_payload: raw.clone(),
        })
    }
}
