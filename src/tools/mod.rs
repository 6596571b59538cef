pub mod intel_scrape;
pub mod intel_search;
pub mod intel_stats;
pub mod settings_status;

use chrono::{DateTime, Utc};
use intel_scrape::IntelScrapeParams;
use intel_search::IntelSearchParams;
use intel_stats::IntelStatsParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use settings_status::SettingsStatusParams;

use crate::context::AppContext;
use crate::intel::types::{IntelQuery, SortOrder, Source};
use crate::settings;

/// The MCP tool handler. Holds the shared [`AppContext`] and exposes the
/// intel and settings tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct CoachTools {
    tool_router: ToolRouter<Self>,
    ctx: AppContext,
}

fn parse_timestamp(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| format!("{field} must be an RFC 3339 timestamp: {e}"))
        })
        .transpose()
}

impl IntelSearchParams {
    fn to_query(&self) -> Result<IntelQuery, String> {
        Ok(IntelQuery {
            source: self.source.as_deref().map(str::parse::<Source>).transpose()?,
            since: parse_timestamp("since", self.since.as_deref())?,
            until: parse_timestamp("until", self.until.as_deref())?,
            limit: self.limit,
            order: self
                .order
                .as_deref()
                .map(str::parse::<SortOrder>)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

#[tool_router]
impl CoachTools {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            tool_router: Self::tool_router(),
            ctx,
        }
    }

    /// Query stored intelligence records.
    #[tool(description = "Search harvested intelligence (papers, posts, news, funding rounds) by source and fetch time. Newest first by default.")]
    async fn intel_search(
        &self,
        Parameters(params): Parameters<IntelSearchParams>,
    ) -> Result<String, String> {
        let query = params.to_query()?;
        let compact = params.compact.unwrap_or(true);
        tracing::info!(source = ?query.source, limit = query.effective_limit(), "intel_search called");

        let intel = self.ctx.intel.clone();
        let mut records = tokio::task::spawn_blocking(move || intel.query(&query))
            .await
            .map_err(|e| format!("db task failed: {e}"))?
            .map_err(|e| format!("query failed: {e}"))?;

        if compact {
            for record in &mut records {
                record.raw_payload = serde_json::Value::Null;
            }
        }

        serde_json::to_string(&serde_json::json!({
            "count": records.len(),
            "items": records,
        }))
        .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Run scrapers now and store what they find.
    #[tool(description = "Scrape sources now (arxiv, reddit, newsapi, devto, crunchbase, hackernews, rss) and store new items. Returns per-source counts.")]
    async fn intel_scrape(
        &self,
        Parameters(params): Parameters<IntelScrapeParams>,
    ) -> Result<String, String> {
        let sources = params
            .sources
            .unwrap_or_default()
            .iter()
            .map(|s| s.parse::<Source>())
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(sources = ?sources, "intel_scrape called");

        let report = self.ctx.run_sources(&sources).await;
        serde_json::to_string(&report).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Intel store statistics.
    #[tool(description = "Get intelligence store statistics: item counts per source, fetch time range, recent scrape runs.")]
    async fn intel_stats(
        &self,
        Parameters(params): Parameters<IntelStatsParams>,
    ) -> Result<String, String> {
        let run_limit = params.runs.unwrap_or(10).clamp(1, 100);
        tracing::info!(run_limit, "intel_stats called");

        let intel = self.ctx.intel.clone();
        let stats = tokio::task::spawn_blocking(move || intel.stats(run_limit))
            .await
            .map_err(|e| format!("db task failed: {e}"))?
            .map_err(|e| format!("stats failed: {e}"))?;
        serde_json::to_string(&stats).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Which settings are configured. Never returns secret values.
    #[tool(description = "Report which settings (LLM provider, API keys) are configured. Secret values are masked.")]
    async fn settings_status(
        &self,
        Parameters(_params): Parameters<SettingsStatusParams>,
    ) -> Result<String, String> {
        tracing::info!("settings_status called");
        let key = self.ctx.secret_key().map_err(|e| e.to_string())?;
        let store = self.ctx.secrets.clone();
        let view = tokio::task::spawn_blocking(move || settings::read_settings(&store, &key))
            .await
            .map_err(|e| format!("settings task failed: {e}"))?
            .map_err(|e| format!("settings read failed: {e}"))?;
        serde_json::to_string(&view).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for CoachTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Coach intel server. Use intel_search to read harvested items, \
                 intel_scrape to refresh sources, and intel_stats for an overview."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
