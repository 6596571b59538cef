//! MCP `intel_search` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `intel_search` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IntelSearchParams {
    /// Restrict to one source, e.g. `"arxiv"` or `"reddit"`.
    #[schemars(
        description = "Restrict to one source: hackernews, reddit, rss, github_trending, arxiv, devto, crunchbase, newsapi"
    )]
    pub source: Option<String>,

    /// Only records fetched at or after this RFC 3339 timestamp.
    #[schemars(description = "Only records fetched at or after this RFC 3339 timestamp")]
    pub since: Option<String>,

    /// Only records fetched before this RFC 3339 timestamp.
    #[schemars(description = "Only records fetched before this RFC 3339 timestamp")]
    pub until: Option<String>,

    #[schemars(description = "Maximum number of records (1-500). Defaults to 50.")]
    pub limit: Option<usize>,

    #[schemars(description = "'newest' (default) or 'oldest'")]
    pub order: Option<String>,

    /// Drop `raw_payload` from each record to keep responses small.
    #[schemars(description = "If true (default), omit the raw upstream payload from each record")]
    pub compact: Option<bool>,
}
