#![allow(dead_code)]

use chrono::{DateTime, Utc};
use coach_intel::config::{CoachConfig, HttpConfig};
use coach_intel::context::AppContext;
use coach_intel::db;
use coach_intel::intel::types::{IntelligenceRecord, Source};
use coach_intel::intel::IntelStore;
use coach_intel::secrets::SecretStore;
use rusqlite::Connection;
use tempfile::TempDir;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

pub fn test_store() -> IntelStore {
    IntelStore::from_connection(test_db())
}

/// A minimal record with a deterministic title and URL.
pub fn record(source: Source, external_id: &str, fetched_at: DateTime<Utc>) -> IntelligenceRecord {
    IntelligenceRecord {
        source,
        external_id: external_id.to_string(),
        title: format!("Item {external_id}"),
        url: format!("https://example.com/{external_id}"),
        summary: String::new(),
        score: None,
        published_at: None,
        fetched_at,
        raw_payload: serde_json::json!({ "id": external_id }),
    }
}

/// HTTP settings for tests: short timeout, one retry, near-zero back-off.
pub fn fast_http() -> HttpConfig {
    HttpConfig {
        timeout_secs: 5,
        max_retries: 1,
        backoff_base_ms: 1,
        user_agent: "coach-intel-tests".into(),
    }
}

/// Config rooted in `dir`, with every upstream pointed at `base_url`.
pub fn test_config(dir: &TempDir, base_url: &str, secret: Option<&str>) -> CoachConfig {
    let mut config = CoachConfig::default();
    config.storage.db_path = dir.path().join("intel.db").to_string_lossy().into_owned();
    config.storage.secrets_path = dir.path().join("secrets.enc").to_string_lossy().into_owned();
    config.security.secret_key = secret.map(str::to_string);

    let scrapers = &mut config.scrapers;
    scrapers.http = fast_http();
    scrapers.arxiv.base_url = format!("{base_url}/arxiv/query");
    scrapers.reddit.base_url = format!("{base_url}/reddit");
    scrapers.newsapi.base_url = format!("{base_url}/newsapi/v2");
    scrapers.devto.base_url = format!("{base_url}/devto/api");
    scrapers.crunchbase.base_url = format!("{base_url}/crunchbase/v4");
    scrapers.hackernews.base_url = format!("{base_url}/hn/v1");
    scrapers.rss.feeds = vec![format!("{base_url}/feed.xml")];
    config
}

pub fn test_context(dir: &TempDir, base_url: &str, secret: Option<&str>) -> AppContext {
    AppContext::from_config(test_config(dir, base_url, secret)).unwrap()
}

pub fn secret_store(dir: &TempDir) -> SecretStore {
    SecretStore::new(dir.path().join("secrets.enc"))
}
