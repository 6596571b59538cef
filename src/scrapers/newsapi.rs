//! NewsAPI `/everything` collector. Requires an API key.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::http::{endpoint, HttpSession};
use super::{decode_item, require_text, Scraper, ScraperError};
use crate::config::{HttpConfig, NewsApiConfig};
use crate::intel::types::{IntelligenceRecord, Source};

/// NewsAPI error codes that mean the key itself is unusable.
const AUTH_ERROR_CODES: [&str; 3] = ["apiKeyInvalid", "apiKeyDisabled", "apiKeyMissing"];

/// Widest search window accepted for `days_back`. NewsAPI serves at most a
/// few years of history on any plan.
const MAX_DAYS_BACK: i64 = 3650;

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    source: Option<ArticleSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

pub struct NewsApiScraper {
    config: NewsApiConfig,
    api_key: String,
    session: HttpSession,
}

impl NewsApiScraper {
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] when no API key is configured.
    pub fn new(config: NewsApiConfig, http: HttpConfig) -> Result<Self, ScraperError> {
        let api_key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                return Err(ScraperError::Configuration {
                    upstream: Source::Newsapi,
                    message: "api_key is required".into(),
                })
            }
        };
        if !(0..=MAX_DAYS_BACK).contains(&config.days_back) {
            return Err(ScraperError::Configuration {
                upstream: Source::Newsapi,
                message: format!(
                    "days_back must be between 0 and {MAX_DAYS_BACK}, got {}",
                    config.days_back
                ),
            });
        }
        Ok(Self {
            config,
            api_key,
            session: HttpSession::new(Source::Newsapi, http),
        })
    }

    pub fn config(&self) -> &NewsApiConfig {
        &self.config
    }

    /// Lower bound of the search window, as the `YYYY-MM-DD` NewsAPI expects.
    fn from_date(&self, now: DateTime<Utc>) -> String {
        (now - Duration::days(self.config.days_back))
            .format("%Y-%m-%d")
            .to_string()
    }

    fn check_envelope(&self, envelope: &Envelope) -> Result<(), ScraperError> {
        if envelope.status == "ok" {
            return Ok(());
        }
        let code = envelope.code.as_deref().unwrap_or("unknown");
        if AUTH_ERROR_CODES.contains(&code) {
            return Err(ScraperError::Authentication {
                upstream: Source::Newsapi,
                status: 401,
            });
        }
        Err(ScraperError::Api {
            upstream: Source::Newsapi,
            message: format!(
                "{code}: {}",
                envelope.message.as_deref().unwrap_or("no message")
            ),
        })
    }
}

#[async_trait]
impl Scraper for NewsApiScraper {
    fn source(&self) -> Source {
        Source::Newsapi
    }

    fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError> {
        let from = self.from_date(Utc::now());
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for query in &self.config.queries {
            let url = endpoint(
                Source::Newsapi,
                &self.config.base_url,
                "everything",
                &[
                    ("q", query.clone()),
                    ("from", from.clone()),
                    ("sortBy", "publishedAt".into()),
                    ("language", "en".into()),
                    ("pageSize", self.config.page_size.to_string()),
                ],
            )?;
            let api_key = self.api_key.as_str();

            let envelope: Envelope = self
                .session
                .fetch_json("NewsAPI response", |client| {
                    client.get(url.clone()).header("X-Api-Key", api_key)
                })
                .await?;
            self.check_envelope(&envelope)?;

            tracing::debug!(query = %query, count = envelope.articles.len(), "fetched articles");
            // the same story often matches several queries
            for article in envelope.articles.into_iter().take(self.config.page_size) {
                let key = article
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if let Some(url) = key {
                    if !seen.insert(url) {
                        continue;
                    }
                }
                items.push(article);
            }
        }
        Ok(items)
    }

    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError> {
        let article: Article = decode_item(Source::Newsapi, raw)?;
        let url = require_text("url", article.url.as_deref())?;
        let title = require_text("title", article.title.as_deref())?;
        if title == "[Removed]" {
            return Err(ScraperError::Normalization("article was removed".into()));
        }

        let outlet = article.source.and_then(|s| s.name);
        let byline = match (outlet, article.author) {
            (Some(outlet), Some(author)) => format!("{outlet} ({author})"),
            (Some(name), None) | (None, Some(name)) => name,
            (None, None) => String::new(),
        };
        let description = article.description.unwrap_or_default();
        let summary = match (byline.is_empty(), description.trim().is_empty()) {
            (true, _) => description.trim().to_string(),
            (false, true) => byline,
            (false, false) => format!("{byline}: {}", description.trim()),
        };

        Ok(IntelligenceRecord {
            source: Source::Newsapi,
            external_id: url.clone(),
            title,
            url,
            summary,
            score: None,
            published_at: article.published_at,
            fetched_at,
            raw_payload: raw.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn scraper() -> NewsApiScraper {
        let config = NewsApiConfig {
            api_key: Some("test_key".into()),
            ..Default::default()
        };
        NewsApiScraper::new(config, HttpConfig::default()).unwrap()
    }

    #[test]
    fn missing_key_is_configuration_error() {
        let err = NewsApiScraper::new(NewsApiConfig::default(), HttpConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ScraperError::Configuration { .. }));

        let blank = NewsApiConfig {
            api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(NewsApiScraper::new(blank, HttpConfig::default()).is_err());
    }

    #[test]
    fn from_date_honours_days_back() {
        let config = NewsApiConfig {
            api_key: Some("k".into()),
            days_back: 3,
            ..Default::default()
        };
        let scraper = NewsApiScraper::new(config, HttpConfig::default()).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(scraper.from_date(now), "2026-03-07");
    }

    #[test]
    fn days_back_out_of_range_is_configuration_error() {
        for days_back in [-1, MAX_DAYS_BACK + 1, 1_000_000_000_000] {
            let config = NewsApiConfig {
                api_key: Some("k".into()),
                days_back,
                ..Default::default()
            };
            let err = NewsApiScraper::new(config, HttpConfig::default()).err().unwrap();
            assert!(matches!(err, ScraperError::Configuration { .. }), "{days_back}");
        }

        let widest = NewsApiConfig {
            api_key: Some("k".into()),
            days_back: MAX_DAYS_BACK,
            ..Default::default()
        };
        let scraper = NewsApiScraper::new(widest, HttpConfig::default()).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert!(scraper.from_date(now).starts_with("2016-03"));
    }

    #[test]
    fn error_envelope_maps_to_auth_or_api() {
        let scraper = scraper();
        let invalid = Envelope {
            status: "error".into(),
            code: Some("apiKeyInvalid".into()),
            message: Some("Your API key is invalid".into()),
            articles: vec![],
        };
        assert!(matches!(
            scraper.check_envelope(&invalid),
            Err(ScraperError::Authentication { .. })
        ));

        let limited = Envelope {
            status: "error".into(),
            code: Some("parameterInvalid".into()),
            message: None,
            articles: vec![],
        };
        assert!(matches!(
            scraper.check_envelope(&limited),
            Err(ScraperError::Api { .. })
        ));
    }

    #[test]
    fn normalize_uses_url_as_identity() {
        let raw = json!({
            "source": {"id": null, "name": "TechCrunch"},
            "author": "Jane Doe",
            "title": "Acme raises $10M",
            "description": "The round was led by Example Ventures.",
            "url": "https://techcrunch.com/acme",
            "publishedAt": "2026-03-09T08:00:00Z"
        });
        let record = scraper().normalize(&raw, Utc::now()).unwrap();
        assert_eq!(record.external_id, "https://techcrunch.com/acme");
        assert_eq!(
            record.summary,
            "TechCrunch (Jane Doe): The round was led by Example Ventures."
        );
        assert!(record.published_at.is_some());
    }

    #[test]
    fn removed_articles_are_skipped() {
        let raw = json!({"title": "[Removed]", "url": "https://removed.com"});
        assert!(scraper().normalize(&raw, Utc::now()).is_err());
    }
}
