//! Run several sources concurrently, one tokio task each.
//!
//! A failing source never aborts its siblings: every requested source gets a
//! [`SourceOutcome`] in the returned [`BatchReport`], in request order.

use std::sync::Arc;

use serde::Serialize;

use super::registry::{ApiKeys, ScraperRegistry};
use super::{run_scraper, FailureKind, ScraperError};
use crate::config::ScrapersConfig;
use crate::intel::store::RunLogEntry;
use crate::intel::types::{RunSummary, Source};
use crate::intel::IntelStore;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Completed(RunSummary),
    Failed {
        source: Source,
        kind: FailureKind,
        message: String,
    },
}

impl SourceOutcome {
    pub fn source(&self) -> Source {
        match self {
            Self::Completed(summary) => summary.source,
            Self::Failed { source, .. } => *source,
        }
    }

    fn failed(source: Source, err: &ScraperError) -> Self {
        Self::Failed {
            source,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl BatchReport {
    pub fn new_items(&self) -> usize {
        self.completed().map(|s| s.new).sum()
    }

    pub fn completed(&self) -> impl Iterator<Item = &RunSummary> {
        self.outcomes.iter().filter_map(|o| match o {
            SourceOutcome::Completed(summary) => Some(summary),
            SourceOutcome::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SourceOutcome::Failed { .. }))
            .count()
    }
}

/// Everything a batch needs, cheap to clone into each task.
#[derive(Clone)]
pub struct BatchInputs {
    pub registry: Arc<ScraperRegistry>,
    pub config: Arc<ScrapersConfig>,
    pub keys: ApiKeys,
    pub store: IntelStore,
}

pub async fn run_batch(inputs: BatchInputs, sources: &[Source]) -> BatchReport {
    let mut handles = Vec::with_capacity(sources.len());
    for &source in sources {
        let inputs = inputs.clone();
        let handle = tokio::spawn(async move { run_one(inputs, source).await });
        handles.push((source, handle));
    }

    let mut report = BatchReport::default();
    for (source, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(source = %source, error = %e, "scraper task panicked");
                SourceOutcome::failed(source, &ScraperError::Task(e.to_string()))
            }
        };
        report.outcomes.push(outcome);
    }

    tracing::info!(
        sources = report.outcomes.len(),
        failures = report.failures(),
        new_items = report.new_items(),
        "batch finished"
    );
    report
}

async fn run_one(inputs: BatchInputs, source: Source) -> SourceOutcome {
    let mut scraper = match inputs.registry.build(source, &inputs.config, &inputs.keys) {
        Ok(scraper) => scraper,
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "could not build scraper");
            let run_id = uuid::Uuid::now_v7().to_string();
            let entry = RunLogEntry::failed(&run_id, source, &e.to_string());
            let store = inputs.store.clone();
            match tokio::task::spawn_blocking(move || store.record_run(&entry)).await {
                Ok(Ok(())) => {}
                Ok(Err(log_err)) => {
                    tracing::warn!(source = %source, error = %log_err, "failed to record scrape run")
                }
                Err(join_err) => {
                    tracing::warn!(source = %source, error = %join_err, "run log task failed")
                }
            }
            return SourceOutcome::failed(source, &e);
        }
    };

    match run_scraper(scraper.as_mut(), &inputs.store).await {
        Ok(summary) => SourceOutcome::Completed(summary),
        Err(e) => SourceOutcome::failed(source, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(source: Source, new: usize) -> RunSummary {
        RunSummary {
            run_id: "r".into(),
            source,
            fetched: new,
            new,
            duplicates: 0,
            failed: 0,
        }
    }

    #[test]
    fn report_totals() {
        let report = BatchReport {
            outcomes: vec![
                SourceOutcome::Completed(summary(Source::Devto, 3)),
                SourceOutcome::Completed(summary(Source::Arxiv, 2)),
                SourceOutcome::Failed {
                    source: Source::Newsapi,
                    kind: FailureKind::Configuration,
                    message: "api_key is required".into(),
                },
            ],
        };
        assert_eq!(report.new_items(), 5);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.outcomes[2].source(), Source::Newsapi);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let failed = SourceOutcome::Failed {
            source: Source::Crunchbase,
            kind: FailureKind::Authentication,
            message: "nope".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "authentication");
        assert_eq!(json["source"], "crunchbase");

        let done = serde_json::to_value(SourceOutcome::Completed(summary(Source::Rss, 1))).unwrap();
        assert_eq!(done["status"], "completed");
        assert_eq!(done["new"], 1);
    }

    #[tokio::test]
    async fn unsupported_source_is_reported_not_fatal() {
        let conn = crate::db::open_memory_database().unwrap();
        let store = IntelStore::from_connection(conn);
        let inputs = BatchInputs {
            registry: Arc::new(ScraperRegistry::default()),
            config: Arc::new(ScrapersConfig::default()),
            keys: ApiKeys::default(),
            store: store.clone(),
        };
        let report = run_batch(inputs, &[Source::GithubTrending, Source::Newsapi]).await;
        assert_eq!(report.outcomes.len(), 2);
        assert!(matches!(
            &report.outcomes[0],
            SourceOutcome::Failed { kind: FailureKind::Configuration, .. }
        ));
        assert!(matches!(
            &report.outcomes[1],
            SourceOutcome::Failed { source: Source::Newsapi, kind: FailureKind::Configuration, .. }
        ));
        let runs = store.stats(10).unwrap().recent_runs;
        assert_eq!(runs.len(), 2);
    }
}
