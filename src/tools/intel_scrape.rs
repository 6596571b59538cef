use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IntelScrapeParams {
    #[schemars(
        description = "Sources to scrape now, e.g. ['arxiv', 'devto']. Omit to run every configured source."
    )]
    pub sources: Option<Vec<String>>,
}
