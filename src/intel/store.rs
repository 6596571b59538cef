//! Write and read paths for the `intel_items` and `scrape_runs` tables.
//!
//! Ingestion is idempotent: [`insert_record`] relies on the unique
//! `(source, external_id)` index, so re-fetching an upstream item is a no-op.
//! Each call commits on its own, which keeps an interrupted run resumable.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::intel::types::{IntelQuery, IntelligenceRecord, RunSummary, SortOrder, Source};

const RECORD_COLUMNS: &str =
    "source, external_id, title, url, summary, score, published_at, fetched_at, raw_payload";

/// Canonical timestamp text. Fixed width so lexical order matches time order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Insert a record unless `(source, external_id)` is already stored.
///
/// Returns `true` when a new row was created.
pub fn insert_record(conn: &Connection, record: &IntelligenceRecord) -> rusqlite::Result<bool> {
    let payload = serde_json::to_string(&record.raw_payload)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO intel_items ({RECORD_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            record.source.as_str(),
            record.external_id,
            record.title,
            record.url,
            record.summary,
            record.score,
            record.published_at.as_ref().map(format_timestamp),
            format_timestamp(&record.fetched_at),
            payload,
        ],
    )?;

    Ok(inserted == 1)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<IntelligenceRecord> {
    let source: String = row.get(0)?;
    let published_at: Option<String> = row.get(6)?;
    let fetched_at: String = row.get(7)?;
    let payload: String = row.get(8)?;

    Ok(IntelligenceRecord {
        source: source
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.into()))?,
        external_id: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        summary: row.get(4)?,
        score: row.get(5)?,
        published_at: published_at
            .as_deref()
            .map(|text| parse_timestamp(6, text))
            .transpose()?,
        fetched_at: parse_timestamp(7, &fetched_at)?,
        raw_payload: serde_json::from_str(&payload)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
    })
}

/// Fetch one record by its natural key.
pub fn get_record(
    conn: &Connection,
    source: Source,
    external_id: &str,
) -> rusqlite::Result<Option<IntelligenceRecord>> {
    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM intel_items WHERE source = ?1 AND external_id = ?2"),
        params![source.as_str(), external_id],
        row_to_record,
    )
    .optional()
}

/// Read records matching `query`, newest first unless asked otherwise.
pub fn query_records(
    conn: &Connection,
    query: &IntelQuery,
) -> rusqlite::Result<Vec<IntelligenceRecord>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(source) = query.source {
        clauses.push("source = ?");
        values.push(Box::new(source.as_str()));
    }
    if let Some(since) = &query.since {
        clauses.push("fetched_at >= ?");
        values.push(Box::new(format_timestamp(since)));
    }
    if let Some(until) = &query.until {
        clauses.push("fetched_at < ?");
        values.push(Box::new(format_timestamp(until)));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let direction = match query.order {
        SortOrder::Newest => "DESC",
        SortOrder::Oldest => "ASC",
    };
    values.push(Box::new(query.effective_limit() as i64));

    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM intel_items {where_clause} \
         ORDER BY fetched_at {direction}, id {direction} LIMIT ?"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), row_to_record)?;
    rows.collect()
}

/// Final state of a scraper run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One row of the `scrape_runs` table.
#[derive(Debug, Clone, Serialize)]
pub struct RunLogEntry {
    pub run_id: String,
    pub source: String,
    pub status: RunStatus,
    pub fetched: u64,
    pub new_items: u64,
    pub duplicates: u64,
    pub failed: u64,
    pub error: Option<String>,
    pub finished_at: String,
}

impl RunLogEntry {
    pub fn completed(summary: &RunSummary) -> Self {
        Self {
            run_id: summary.run_id.clone(),
            source: summary.source.as_str().to_string(),
            status: RunStatus::Completed,
            fetched: summary.fetched as u64,
            new_items: summary.new as u64,
            duplicates: summary.duplicates as u64,
            failed: summary.failed as u64,
            error: None,
            finished_at: format_timestamp(&Utc::now()),
        }
    }

    pub fn failed(run_id: &str, source: Source, error: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            source: source.as_str().to_string(),
            status: RunStatus::Failed,
            fetched: 0,
            new_items: 0,
            duplicates: 0,
            failed: 0,
            error: Some(error.to_string()),
            finished_at: format_timestamp(&Utc::now()),
        }
    }
}

/// Append a run to the audit table.
pub fn record_run(conn: &Connection, entry: &RunLogEntry) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO scrape_runs (id, source, status, fetched, new_items, duplicates, failed, error, finished_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.run_id,
            entry.source,
            entry.status.as_str(),
            entry.fetched as i64,
            entry.new_items as i64,
            entry.duplicates as i64,
            entry.failed as i64,
            entry.error,
            entry.finished_at,
        ],
    )?;
    Ok(())
}

/// Most recent runs first.
pub fn recent_runs(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<RunLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, source, status, fetched, new_items, duplicates, failed, error, finished_at \
         FROM scrape_runs ORDER BY finished_at DESC, id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        let status: String = row.get(2)?;
        Ok(RunLogEntry {
            run_id: row.get(0)?,
            source: row.get(1)?,
            status: if status == "completed" {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            },
            fetched: row.get::<_, i64>(3)? as u64,
            new_items: row.get::<_, i64>(4)? as u64,
            duplicates: row.get::<_, i64>(5)? as u64,
            failed: row.get::<_, i64>(6)? as u64,
            error: row.get(7)?,
            finished_at: row.get(8)?,
        })
    })?;
    rows.collect()
}
