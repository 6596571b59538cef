//! JSON HTTP API over the intel store and settings.
//!
//! Routes:
//!
//! | method | path | |
//! |---|---|---|
//! | GET | `/health` | database status |
//! | GET / PUT | `/api/settings` | masked settings view / partial update |
//! | GET | `/api/intel` | query stored records |
//! | GET | `/api/intel/stats` | per-source counts and recent runs |
//! | POST | `/api/intel/scrape?sources=a,b` | run scrapers now |

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::db::{self, HealthReport};
use crate::intel::stats::IntelStats;
use crate::intel::types::{IntelQuery, IntelligenceRecord, Source};
use crate::scrapers::batch::BatchReport;
use crate::secrets::SecretsError;
use crate::settings::{self, SettingsUpdate, SettingsView};

const DEFAULT_RUN_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    fn internal(context: &str, error: impl std::fmt::Display) -> Self {
        tracing::error!(error = %error, "{context} failed");
        Self::new("internal_error", format!("{context} failed"))
    }
}

impl From<SecretsError> for ApiError {
    fn from(error: SecretsError) -> Self {
        match error {
            SecretsError::MissingKey => Self::new("not_configured", error.to_string()),
            other => Self::internal("settings storage", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Run blocking store work off the async executor.
async fn blocking<T, F>(context: &'static str, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(context, e))?
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: HealthReport,
}

async fn health(State(ctx): State<AppContext>) -> Result<Json<HealthData>, ApiError> {
    let intel = ctx.intel.clone();
    let report = blocking("health check", move || {
        intel
            .with_conn(db::check_database_health)
            .map_err(|e| ApiError::internal("health check", e))
    })
    .await?;
    let status = if report.integrity_ok { "ok" } else { "degraded" };
    Ok(Json(HealthData {
        status,
        database: report,
    }))
}

async fn get_settings(State(ctx): State<AppContext>) -> Result<Json<SettingsView>, ApiError> {
    let key = ctx.secret_key()?;
    let store = ctx.secrets.clone();
    let view = blocking("settings read", move || {
        Ok(settings::read_settings(&store, &key)?)
    })
    .await?;
    Ok(Json(view))
}

async fn put_settings(
    State(ctx): State<AppContext>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsView>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::new("validation_error", "no settings provided"));
    }
    let key = ctx.secret_key()?;
    let store = ctx.secrets.clone();
    let view = blocking("settings update", move || {
        Ok(settings::apply_update(&store, &key, &update)?)
    })
    .await?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
struct IntelPage {
    count: usize,
    items: Vec<IntelligenceRecord>,
}

async fn list_intel(
    State(ctx): State<AppContext>,
    Query(query): Query<IntelQuery>,
) -> Result<Json<IntelPage>, ApiError> {
    let intel = ctx.intel.clone();
    let items = blocking("intel query", move || {
        intel
            .query(&query)
            .map_err(|e| ApiError::internal("intel query", e))
    })
    .await?;
    Ok(Json(IntelPage {
        count: items.len(),
        items,
    }))
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    runs: Option<usize>,
}

async fn intel_stats(
    State(ctx): State<AppContext>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<IntelStats>, ApiError> {
    let intel = ctx.intel.clone();
    let run_limit = query.runs.unwrap_or(DEFAULT_RUN_LIMIT).clamp(1, 100);
    let stats = blocking("intel stats", move || {
        intel
            .stats(run_limit)
            .map_err(|e| ApiError::internal("intel stats", e))
    })
    .await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
struct ScrapeQuery {
    /// Comma-separated source names; empty or absent means all.
    sources: Option<String>,
}

pub(crate) fn parse_sources(list: Option<&str>) -> Result<Vec<Source>, String> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<Source>)
        .collect()
}

async fn scrape(
    State(ctx): State<AppContext>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<BatchReport>, ApiError> {
    let sources = parse_sources(query.sources.as_deref())
        .map_err(|e| ApiError::new("bad_request", e))?;
    let report = ctx.run_sources(&sources).await;
    Ok(Json(report))
}

pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/intel", get(list_intel))
        .route("/api/intel/stats", get(intel_stats))
        .route("/api/intel/scrape", post(scrape))
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_status() {
        let response = ApiError::new("validation_error", "bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = ApiError::from(SecretsError::MissingKey).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let response = ApiError::new("boom", "bad").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn source_lists_parse() {
        assert!(parse_sources(None).unwrap().is_empty());
        assert_eq!(
            parse_sources(Some("devto, arxiv")).unwrap(),
            vec![Source::Devto, Source::Arxiv]
        );
        assert!(parse_sources(Some("devto,friendster")).is_err());
    }
}
