//! The intelligence store: normalized records keyed by `(source, external_id)`.
//!
//! [`IntelStore`] wraps a shared SQLite connection. The free functions in
//! [`store`] and [`stats`] take a `&Connection` so they can also be called
//! directly from tests and CLI commands.

pub mod stats;
pub mod store;
pub mod types;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use stats::IntelStats;
use store::RunLogEntry;
use types::{IntelQuery, IntelligenceRecord, Source};

/// Shared handle to the intelligence database.
///
/// Cloning is cheap; all clones use the same connection. Methods are
/// synchronous, so async callers should go through `spawn_blocking`.
#[derive(Clone)]
pub struct IntelStore {
    conn: Arc<Mutex<Connection>>,
}

impl IntelStore {
    /// Open (or create) the database file with WAL enabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = crate::db::open_database(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-initialized connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` with the connection locked.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("db lock poisoned: {e}"))?;
        Ok(f(&conn)?)
    }

    /// Idempotent insert. Returns `true` if a new row was created.
    pub fn insert(&self, record: &IntelligenceRecord) -> Result<bool> {
        self.with_conn(|conn| store::insert_record(conn, record))
    }

    pub fn get(&self, source: Source, external_id: &str) -> Result<Option<IntelligenceRecord>> {
        self.with_conn(|conn| store::get_record(conn, source, external_id))
    }

    pub fn query(&self, query: &IntelQuery) -> Result<Vec<IntelligenceRecord>> {
        self.with_conn(|conn| store::query_records(conn, query))
    }

    pub fn record_run(&self, entry: &RunLogEntry) -> Result<()> {
        self.with_conn(|conn| store::record_run(conn, entry))
    }

    pub fn stats(&self, run_limit: usize) -> Result<IntelStats> {
        self.with_conn(|conn| stats::intel_stats(conn, run_limit))
    }
}
