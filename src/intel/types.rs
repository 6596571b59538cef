//! Intelligence record type definitions.
//!
//! Defines [`Source`] (the upstream providers), [`IntelligenceRecord`] (one
//! normalized item), [`RunSummary`] (counts from one scraper run), and the
//! query types used to read the store back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An upstream provider of intelligence records. Also the storage partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Hackernews,
    Reddit,
    Rss,
    GithubTrending,
    Arxiv,
    Devto,
    Crunchbase,
    Newsapi,
}

impl Source {
    pub const ALL: [Source; 8] = [
        Self::Hackernews,
        Self::Reddit,
        Self::Rss,
        Self::GithubTrending,
        Self::Arxiv,
        Self::Devto,
        Self::Crunchbase,
        Self::Newsapi,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hackernews => "hackernews",
            Self::Reddit => "reddit",
            Self::Rss => "rss",
            Self::GithubTrending => "github_trending",
            Self::Arxiv => "arxiv",
            Self::Devto => "devto",
            Self::Crunchbase => "crunchbase",
            Self::Newsapi => "newsapi",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown source: {s}"))
    }
}

/// One harvested item in the common shape shared by every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceRecord {
    pub source: Source,
    /// Upstream identifier, unique within `source`.
    pub external_id: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    /// Engagement signal; meaning depends on the source (points, reactions, USD raised).
    pub score: Option<f64>,
    /// Publication time reported by the upstream API, if any.
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    /// The upstream item exactly as fetched.
    pub raw_payload: serde_json::Value,
}

/// Counts reported by one scraper run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// UUID v7 identifying the run in `scrape_runs`.
    pub run_id: String,
    pub source: Source,
    pub fetched: usize,
    pub new: usize,
    pub duplicates: usize,
    /// Items skipped because they could not be normalized.
    pub failed: usize,
}

/// Sort direction for [`IntelQuery`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            _ => Err(format!("unknown sort order: {s}")),
        }
    }
}

pub const DEFAULT_QUERY_LIMIT: usize = 50;
pub const MAX_QUERY_LIMIT: usize = 500;

/// Filters for reading records back out of the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntelQuery {
    pub source: Option<Source>,
    /// Inclusive lower bound on `fetched_at`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `fetched_at`.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub order: SortOrder,
}

impl IntelQuery {
    /// The effective row limit: defaults to 50, clamped to `1..=500`.
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_QUERY_LIMIT)
            .clamp(1, MAX_QUERY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_round_trip() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert!("myspace".parse::<Source>().is_err());
    }

    #[test]
    fn source_serializes_snake_case() {
        let json = serde_json::to_string(&Source::GithubTrending).unwrap();
        assert_eq!(json, "\"github_trending\"");
    }

    #[test]
    fn query_limit_is_clamped() {
        assert_eq!(IntelQuery::default().effective_limit(), 50);
        let q = IntelQuery { limit: Some(0), ..Default::default() };
        assert_eq!(q.effective_limit(), 1);
        let q = IntelQuery { limit: Some(10_000), ..Default::default() };
        assert_eq!(q.effective_limit(), 500);
    }
}
