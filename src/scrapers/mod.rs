//! Source connectors.
//!
//! Every upstream implements [`Scraper`]: open a session, fetch a bounded set
//! of raw items, close the session, and map each item to an
//! [`IntelligenceRecord`]. [`run_scraper`] drives one run end to end and
//! [`batch::run_batch`] runs several sources as independent tasks.

pub mod arxiv;
pub mod batch;
pub mod crunchbase;
pub mod devto;
pub mod error;
pub mod feed;
pub mod hackernews;
pub mod http;
pub mod newsapi;
pub mod reddit;
pub mod registry;
mod retry;
pub mod rss;

pub use error::{FailureKind, ScraperError};
pub use http::HttpSession;
pub use registry::{ApiKeys, ScraperRegistry};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::intel::store::RunLogEntry;
use crate::intel::types::{IntelligenceRecord, RunSummary, Source};
use crate::intel::IntelStore;

/// Capability interface for one upstream source.
///
/// `open`/`close` bracket a run; [`run_scraper`] guarantees `close` is called
/// even when `fetch` fails. `normalize` must not perform I/O.
#[async_trait]
pub trait Scraper: Send {
    /// Stable identifier, used as the storage partition key.
    fn source(&self) -> Source;

    /// The session used for upstream requests.
    fn session_mut(&mut self) -> &mut HttpSession;

    async fn open(&mut self) -> Result<(), ScraperError> {
        self.session_mut().open()
    }

    async fn close(&mut self) {
        self.session_mut().close();
    }

    /// Call the upstream API and return raw items in upstream order, bounded
    /// by the source's configured ceiling.
    async fn fetch(&mut self) -> Result<Vec<Value>, ScraperError>;

    /// Map one raw item to the common record shape.
    fn normalize(
        &self,
        raw: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<IntelligenceRecord, ScraperError>;
}

/// Deserialize a raw item into a source-specific shape, reporting failures as
/// per-item normalization errors.
pub(crate) fn decode_item<T: serde::de::DeserializeOwned>(
    source: Source,
    raw: &Value,
) -> Result<T, ScraperError> {
    T::deserialize(raw).map_err(|e| ScraperError::Normalization(format!("{source} item: {e}")))
}

/// Reject items without the fields every record needs.
pub(crate) fn require_text(field: &str, value: Option<&str>) -> Result<String, ScraperError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ScraperError::Normalization(format!("missing {field}"))),
    }
}

/// Fetch, normalize, and store one source's items.
///
/// Per-item normalization failures are logged, counted, and skipped. Fetch,
/// authentication, and storage failures end the run with an error. Either way
/// the outcome is appended to the `scrape_runs` table.
pub async fn run_scraper(
    scraper: &mut dyn Scraper,
    store: &IntelStore,
) -> Result<RunSummary, ScraperError> {
    let run_id = uuid::Uuid::now_v7().to_string();
    let source = scraper.source();
    tracing::info!(run_id = %run_id, source = %source, "scrape run started");

    let result = execute_run(scraper, store, &run_id).await;

    let entry = match &result {
        Ok(summary) => {
            tracing::info!(
                run_id = %run_id,
                source = %source,
                fetched = summary.fetched,
                new = summary.new,
                duplicates = summary.duplicates,
                failed = summary.failed,
                "scrape run finished"
            );
            RunLogEntry::completed(summary)
        }
        Err(e) => {
            tracing::warn!(
                run_id = %run_id,
                source = %source,
                error = %e,
                kind = ?e.kind(),
                "scrape run failed"
            );
            RunLogEntry::failed(&run_id, source, &e.to_string())
        }
    };

    let log_store = store.clone();
    let logged = tokio::task::spawn_blocking(move || log_store.record_run(&entry)).await;
    match logged {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(run_id = %run_id, error = %e, "failed to record scrape run"),
        Err(e) => tracing::warn!(run_id = %run_id, error = %e, "run log task failed"),
    }

    result
}

async fn execute_run(
    scraper: &mut dyn Scraper,
    store: &IntelStore,
    run_id: &str,
) -> Result<RunSummary, ScraperError> {
    let source = scraper.source();

    scraper.open().await?;
    let fetched = scraper.fetch().await;
    scraper.close().await;
    let items = fetched?;

    let fetched_at = Utc::now();
    let mut records = Vec::with_capacity(items.len());
    let mut failed = 0usize;
    for (index, raw) in items.iter().enumerate() {
        match scraper.normalize(raw, fetched_at) {
            Ok(record) => records.push(record),
            Err(e) => {
                failed += 1;
                tracing::warn!(source = %source, index, error = %e, "skipping item");
            }
        }
    }

    let ingest_store = store.clone();
    let (new, duplicates) = tokio::task::spawn_blocking(move || {
        let mut new = 0usize;
        let mut duplicates = 0usize;
        for record in &records {
            if ingest_store.insert(record)? {
                new += 1;
            } else {
                duplicates += 1;
            }
        }
        Ok::<_, anyhow::Error>((new, duplicates))
    })
    .await
    .map_err(|e| ScraperError::Task(e.to_string()))??;

    Ok(RunSummary {
        run_id: run_id.to_string(),
        source,
        fetched: items.len(),
        new,
        duplicates,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_rejects_blank() {
        assert!(require_text("title", None).is_err());
        assert!(require_text("title", Some("   ")).is_err());
        assert_eq!(require_text("title", Some(" Hi ")).unwrap(), "Hi");
    }

    #[test]
    fn decode_item_reports_normalization_error() {
        #[derive(serde::Deserialize)]
        struct Item {
            #[allow(dead_code)]
            id: u64,
        }
        let err = decode_item::<Item>(Source::Devto, &serde_json::json!({"id": "x"}))
            .err()
            .unwrap();
        assert!(matches!(err, ScraperError::Normalization(_)));
    }
}
