use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::intel::store::{recent_runs, RunLogEntry};

/// Response from [`intel_stats`].
#[derive(Debug, Serialize)]
pub struct IntelStats {
    pub total_items: u64,
    pub by_source: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_fetch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_fetch: Option<String>,
    pub recent_runs: Vec<RunLogEntry>,
}

/// Compute store statistics, including the last `run_limit` scraper runs.
pub fn intel_stats(conn: &Connection, run_limit: usize) -> rusqlite::Result<IntelStats> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM intel_items", [], |row| row.get(0))?;

    let mut stmt =
        conn.prepare("SELECT source, COUNT(*) FROM intel_items GROUP BY source ORDER BY source")?;
    let by_source = stmt
        .query_map(params![], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(fetched_at), MAX(fetched_at) FROM intel_items",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(IntelStats {
        total_items: total as u64,
        by_source,
        oldest_fetch: oldest,
        newest_fetch: newest,
        recent_runs: recent_runs(conn, run_limit)?,
    })
}
