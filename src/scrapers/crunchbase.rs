//! Crunchbase v4 funding-round search. Requires an API key.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::http::{endpoint, HttpSession};
use super::{decode_item, require_text, Scraper, ScraperError};
use crate::config::{CrunchbaseConfig, HttpConfig};
use crate::intel::types::{IntelligenceRecord, Source};

const FIELD_IDS: [&str; 7] = [
    "identifier",
    "announced_on",
    "money_raised",
    "investment_type",
    "funded_organization_identifier",
    "short_description",
    "investor_identifiers",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    entities: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    uuid: Option<String>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    identifier: Option<Identifier>,
    funded_organization_identifier: Option<Identifier>,
    announced_on: Option<String>,
    money_raised: Option<Money>,
    investment_type: Option<String>,
    short_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Identifier {
    value: Option<String>,
    permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Money {
    value_usd: Option<f64>,
}

pub struct CrunchbaseScraper {
    config: CrunchbaseConfig,
    api_key: String,
    session: HttpSession,
}

impl CrunchbaseScraper {
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] when no API key is configured.
    pub fn new(config: CrunchbaseConfig, http: HttpConfig) -> Result<Self, ScraperError> {
        let api_key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                return Err(ScraperError::Configuration {
                    upstream: Source::Crunchbase,
                    message: "api_key is required".into(),
                })
            }
        };
        Ok(Self {
            config,
            api_key,
            session: HttpSession::new(Source::Crunchbase, http),
        })
    }

    pub fn config(&self) -> &CrunchbaseConfig {
        &self.config
    }

    fn search_body(&self) -> Value {
        json!({
            "field_ids": FIELD_IDS,
            "order": [{"field_id": "announced_on", "sort": "desc"}],
            "limit": self.config.limit,
        })
    }
}

/// `$12.5M`, `$800K`, `$3.0B`.
fn format_usd(amount: f64) -> String {
    if amount >= 1e9 {
        format!("${:.1}B", amount / 1e9)
    } else if amount >= 1e6 {
        format!("${:.1}M", amount / 1e6)
    } else if amount >= 1e3 {
        format!("${:.0}K", amount / 1e3)
    } else {
        format!("${amount:.0}")
    }
}

#[async_trait]
impl Scraper for CrunchbaseScraper {
    fn source(&self) -> Source {
        Source::Crunchbase
    }

    fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError> {
        let url = endpoint(
            Source::Crunchbase,
            &self.config.base_url,
            "searches/funding_rounds",
            &[],
        )?;
        let body = self.search_body();
        let api_key = self.api_key.as_str();

        let response: SearchResponse = self
            .session
            .fetch_json("Crunchbase search", |client| {
                client
                    .post(url.clone())
                    .header("X-cb-user-key", api_key)
                    .json(&body)
            })
            .await?;
        tracing::debug!(count = response.entities.len(), "fetched funding rounds");
        Ok(response.entities.into_iter().take(self.config.limit).collect())
    }

    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError> {
        let entity: Entity = decode_item(Source::Crunchbase, raw)?;
        let uuid = require_text("uuid", entity.uuid.as_deref())?;
        let props = entity.properties;

        let round_name = props.identifier.as_ref().and_then(|i| i.value.as_deref());
        let org = props.funded_organization_identifier.as_ref();
        let org_name = org.and_then(|o| o.value.as_deref());
        let title = require_text("identifier", round_name.or(org_name))?;

        let url = props
            .identifier
            .as_ref()
            .and_then(|i| i.permalink.as_deref())
            .map(|p| format!("https://www.crunchbase.com/funding_round/{p}"))
            .or_else(|| {
                org.and_then(|o| o.permalink.as_deref())
                    .map(|p| format!("https://www.crunchbase.com/organization/{p}"))
            })
            .unwrap_or_default();

        let amount = props.money_raised.and_then(|m| m.value_usd);
        let mut parts = Vec::new();
        if let Some(kind) = props.investment_type.as_deref() {
            parts.push(kind.replace('_', " "));
        }
        if let Some(amount) = amount {
            parts.push(format_usd(amount));
        }
        if let Some(desc) = props.short_description.as_deref() {
            parts.push(desc.trim().to_string());
        }

        let published_at = props
            .announced_on
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());

        Ok(IntelligenceRecord {
            source: Source::Crunchbase,
            external_id: uuid,
            title,
            url,
            summary: parts.join(" · "),
            score: amount,
            published_at,
            fetched_at,
            raw_payload: raw.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> CrunchbaseScraper {
        let config = CrunchbaseConfig {
            api_key: Some("cb-key".into()),
            ..Default::default()
        };
        CrunchbaseScraper::new(config, HttpConfig::default()).unwrap()
    }

    #[test]
    fn key_is_required() {
        assert!(matches!(
            CrunchbaseScraper::new(CrunchbaseConfig::default(), HttpConfig::default()),
            Err(ScraperError::Configuration { .. })
        ));
    }

    #[test]
    fn search_body_orders_by_announcement() {
        let body = scraper().search_body();
        assert_eq!(body["limit"], 25);
        assert_eq!(body["order"][0]["field_id"], "announced_on");
        assert_eq!(body["order"][0]["sort"], "desc");
        assert!(body["field_ids"]
            .as_array()
            .unwrap()
            .contains(&json!("money_raised")));
    }

    #[test]
    fn normalize_funding_round() {
        let raw = json!({
            "uuid": "4f1c-round",
            "properties": {
                "identifier": {"value": "Series A - Acme", "permalink": "acme-series-a--4f1c"},
                "funded_organization_identifier": {"value": "Acme", "permalink": "acme"},
                "announced_on": "2026-03-02",
                "money_raised": {"value_usd": 12_500_000.0, "currency": "USD"},
                "investment_type": "series_a",
                "short_description": "Acme builds rockets."
            }
        });
        let record = scraper().normalize(&raw, Utc::now()).unwrap();
        assert_eq!(record.external_id, "4f1c-round");
        assert_eq!(record.title, "Series A - Acme");
        assert_eq!(
            record.url,
            "https://www.crunchbase.com/funding_round/acme-series-a--4f1c"
        );
        assert_eq!(record.summary, "series a · $12.5M · Acme builds rockets.");
        assert_eq!(record.score, Some(12_500_000.0));
        assert_eq!(
            record.published_at.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(3_000_000_000.0), "$3.0B");
        assert_eq!(format_usd(800_000.0), "$800K");
        assert_eq!(format_usd(950.0), "$950");
    }
}
