//! Server entry points for the stdio and HTTP transports.
//!
//! [`serve_stdio`] runs the MCP tools over stdin/stdout. [`serve_http`] binds
//! one listener that serves the JSON API and the Streamable HTTP MCP endpoint
//! at `/mcp`.

use anyhow::Result;
use rmcp::ServiceExt;

use crate::api;
use crate::config::CoachConfig;
use crate::context::AppContext;
use crate::tools::CoachTools;

/// Open the stores and log where they live.
fn setup_context(config: CoachConfig) -> Result<AppContext> {
    let ctx = AppContext::from_config(config)?;
    if ctx.secret_key().is_err() {
        tracing::warn!("COACH_SECRET_KEY is not set; settings endpoints will be unavailable");
    }
    tracing::info!(secrets = %ctx.secrets.path().display(), "secret store ready");
    Ok(ctx)
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: CoachConfig) -> Result<()> {
    tracing::info!("starting coach MCP server on stdio");

    let ctx = setup_context(config)?;
    let tools = CoachTools::new(ctx);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the JSON API plus MCP over Streamable HTTP.
pub async fn serve_http(config: CoachConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting coach HTTP server");

    let ctx = setup_context(config)?;

    let mcp_ctx = ctx.clone();
    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(CoachTools::new(mcp_ctx.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = api::build_router(ctx).nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening: API at http://{bind_addr}/api, MCP at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
