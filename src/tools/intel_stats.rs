//! MCP `intel_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `intel_stats` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IntelStatsParams {
    /// How many recent scrape runs to include.
    #[schemars(description = "Number of recent scrape runs to include (1-100). Defaults to 10.")]
    pub runs: Option<usize>,
}
