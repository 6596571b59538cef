//! Dev.to (Forem) public articles API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::http::{endpoint, HttpSession};
use super::{decode_item, require_text, Scraper, ScraperError};
use crate::config::{DevtoConfig, HttpConfig};
use crate::intel::types::{IntelligenceRecord, Source};

#[derive(Debug, Deserialize)]
struct Article {
    id: Option<u64>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    public_reactions_count: Option<f64>,
    #[serde(default)]
    tag_list: Vec<String>,
}

pub struct DevtoScraper {
    config: DevtoConfig,
    session: HttpSession,
}

impl DevtoScraper {
    pub fn new(config: DevtoConfig, http: HttpConfig) -> Self {
        Self {
            config,
            session: HttpSession::new(Source::Devto, http),
        }
    }

    pub fn config(&self) -> &DevtoConfig {
        &self.config
    }
}

#[async_trait]
impl Scraper for DevtoScraper {
    fn source(&self) -> Source {
        Source::Devto
    }

    fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError> {
        let url = endpoint(
            Source::Devto,
            &self.config.base_url,
            "articles",
            &[
                ("per_page", self.config.per_page.to_string()),
                ("top", self.config.top.to_string()),
            ],
        )?;
        let articles: Vec<Value> = self
            .session
            .fetch_json("Dev.to articles", |client| client.get(url.clone()))
            .await?;
        tracing::debug!(count = articles.len(), "fetched Dev.to articles");
        Ok(articles.into_iter().take(self.config.per_page).collect())
    }

    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError> {
        let article: Article = decode_item(Source::Devto, raw)?;
        let id = article
            .id
            .ok_or_else(|| ScraperError::Normalization("missing id".into()))?;
        let title = require_text("title", article.title.as_deref())?;
        let url = require_text("url", article.url.as_deref())?;

        let mut summary = article.description.unwrap_or_default().trim().to_string();
        if !article.tag_list.is_empty() {
            let tags = article
                .tag_list
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" ");
            summary = if summary.is_empty() {
                tags
            } else {
                format!("{summary} {tags}")
            };
        }

        Ok(IntelligenceRecord {
            source: Source::Devto,
            external_id: id.to_string(),
            title,
            url,
            summary,
            score: article.public_reactions_count,
            published_at: article.published_at,
            fetched_at,
            raw_payload: raw.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scraper() -> DevtoScraper {
        DevtoScraper::new(DevtoConfig::default(), HttpConfig::default())
    }

    #[test]
    fn defaults() {
        let scraper = scraper();
        assert_eq!(scraper.config().per_page, 30);
        assert_eq!(scraper.config().top, 7);
    }

    #[test]
    fn normalize_article() {
        let raw = json!({
            "id": 1_234_567,
            "title": "Shipping Rust at a startup",
            "description": "What we learned.",
            "url": "https://dev.to/acme/shipping-rust-1abc",
            "published_at": "2026-03-09T10:00:00Z",
            "public_reactions_count": 88,
            "tag_list": ["rust", "startup"]
        });
        let record = scraper().normalize(&raw, Utc::now()).unwrap();
        assert_eq!(record.external_id, "1234567");
        assert_eq!(record.score, Some(88.0));
        assert_eq!(record.summary, "What we learned. #rust #startup");
    }

    #[test]
    fn string_id_is_malformed() {
        let raw = json!({"id": "abc", "title": "t", "url": "https://dev.to/x"});
        assert!(matches!(
            scraper().normalize(&raw, Utc::now()),
            Err(ScraperError::Normalization(_))
        ));
    }
}
