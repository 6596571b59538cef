use serde::Serialize;
use thiserror::Error;

use crate::intel::types::Source;

/// Errors raised while building or running a scraper.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// A required setting (usually an API key) is missing or invalid.
    #[error("{upstream} is misconfigured: {message}")]
    Configuration { upstream: Source, message: String },

    /// The upstream API rejected our credentials (HTTP 401/403).
    #[error("{upstream} rejected credentials (HTTP {status})")]
    Authentication { upstream: Source, status: u16 },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with an unexpected non-success status.
    #[error("{upstream} returned HTTP {status}: {message}")]
    UpstreamStatus {
        upstream: Source,
        status: u16,
        message: String,
    },

    /// The upstream returned a well-formed error payload.
    #[error("{upstream} API error: {message}")]
    Api { upstream: Source, message: String },

    /// A single upstream item could not be mapped to a record.
    #[error("normalization failed: {0}")]
    Normalization(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("{0} session is not open")]
    SessionClosed(Source),

    #[error("no scraper registered for {0}")]
    UnsupportedSource(Source),

    #[error("scraper task failed: {0}")]
    Task(String),
}

/// Coarse classification used in batch reports so operators can tell a
/// misconfigured source from one that had a blip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Authentication,
    Transient,
    Other,
}

impl ScraperError {
    /// Returns `true` for errors that are worth retrying after a back-off delay:
    /// timeouts, connection failures, HTTP 429 and 5xx.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_body()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration { .. } | Self::UnsupportedSource(_) => FailureKind::Configuration,
            Self::Authentication { .. } => FailureKind::Authentication,
            e if e.is_retriable() => FailureKind::Transient,
            Self::Http(e) if e.is_request() => FailureKind::Transient,
            _ => FailureKind::Other,
        }
    }
}
