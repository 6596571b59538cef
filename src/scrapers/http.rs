//! Scoped HTTP session shared by every scraper.
//!
//! A session is opened at the start of a run and closed at the end. Requests
//! go through [`HttpSession::fetch_text`], which maps HTTP status codes to the
//! scraper error taxonomy and retries transient failures.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::error::ScraperError;
use super::retry::retry_with_backoff;
use crate::config::HttpConfig;
use crate::intel::types::Source;

/// Longest error body excerpt kept in an [`ScraperError::UpstreamStatus`].
const ERROR_BODY_EXCERPT: usize = 200;

pub struct HttpSession {
    source: Source,
    settings: HttpConfig,
    client: Option<Client>,
}

impl HttpSession {
    pub fn new(source: Source, settings: HttpConfig) -> Self {
        Self {
            source,
            settings,
            client: None,
        }
    }

    /// Build the underlying client. Opening an open session is a no-op.
    pub fn open(&mut self) -> Result<(), ScraperError> {
        if self.client.is_some() {
            return Ok(());
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .user_agent(self.settings.user_agent.clone())
            .build()?;
        self.client = Some(client);
        tracing::debug!(source = %self.source, "http session opened");
        Ok(())
    }

    /// Drop the client and its connection pool.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!(source = %self.source, "http session closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Client, ScraperError> {
        self.client
            .as_ref()
            .ok_or(ScraperError::SessionClosed(self.source))
    }

    /// Send the request produced by `build`, retrying transient failures, and
    /// return the response body as text.
    ///
    /// `build` is invoked once per attempt.
    pub async fn fetch_text<F>(&self, build: F) -> Result<String, ScraperError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = self.client()?;
        let source = self.source;
        retry_with_backoff(self.settings.max_retries, self.settings.backoff_base_ms, || {
            let request = build(client);
            async move {
                let response = request.send().await?;
                let response = check_status(source, response).await?;
                Ok::<String, ScraperError>(response.text().await?)
            }
        })
        .await
    }

    /// Like [`fetch_text`](Self::fetch_text) but deserializes a JSON body.
    pub async fn fetch_json<T, F>(&self, context: &str, build: F) -> Result<T, ScraperError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let body = self.fetch_text(build).await?;
        serde_json::from_str(&body).map_err(|source| ScraperError::Parse {
            context: context.to_string(),
            source,
        })
    }
}

async fn check_status(
    source: Source,
    response: reqwest::Response,
) -> Result<reqwest::Response, ScraperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ScraperError::Authentication {
            upstream: source,
            status: status.as_u16(),
        });
    }

    let body = response.text().await.unwrap_or_default();
    Err(ScraperError::UpstreamStatus {
        upstream: source,
        status: status.as_u16(),
        message: body.chars().take(ERROR_BODY_EXCERPT).collect(),
    })
}

/// Join `base` and `path`, then append query parameters.
pub(crate) fn endpoint(
    source: Source,
    base: &str,
    path: &str,
    params: &[(&str, String)],
) -> Result<Url, ScraperError> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let raw = raw.trim_end_matches('/');
    Url::parse_with_params(raw, params).map_err(|e| ScraperError::Configuration {
        upstream: source,
        message: format!("invalid base_url {base:?}: {e}"),
    })
}
