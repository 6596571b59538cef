//! Process-wide application context.
//!
//! Built once at startup and handed to the CLI commands, the MCP tools, and
//! the HTTP handlers. Cloning is cheap.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::CoachConfig;
use crate::intel::types::Source;
use crate::intel::IntelStore;
use crate::scrapers::batch::{run_batch, BatchInputs, BatchReport};
use crate::scrapers::{ApiKeys, ScraperRegistry};
use crate::secrets::{SecretKey, SecretStore, SecretsError};
use crate::settings::{CRUNCHBASE_API_KEY, NEWSAPI_API_KEY};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<CoachConfig>,
    pub intel: IntelStore,
    pub secrets: SecretStore,
    pub registry: Arc<ScraperRegistry>,
}

impl AppContext {
    /// Open the database and point the secret store at its file.
    pub fn from_config(config: CoachConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let intel = IntelStore::open(&db_path)
            .with_context(|| format!("failed to open intel database at {}", db_path.display()))?;
        tracing::info!(db = %db_path.display(), "intel store ready");

        let secrets = SecretStore::new(config.resolved_secrets_path());
        Ok(Self::new(config, intel, secrets))
    }

    pub fn new(config: CoachConfig, intel: IntelStore, secrets: SecretStore) -> Self {
        Self {
            config: Arc::new(config),
            intel,
            secrets,
            registry: Arc::new(ScraperRegistry::default()),
        }
    }

    /// # Errors
    ///
    /// [`SecretsError::MissingKey`] when no server secret is configured.
    pub fn secret_key(&self) -> Result<SecretKey, SecretsError> {
        SecretKey::from_config(self.config.security.secret_key.as_deref())
    }

    /// Scraper API keys held in the secret store.
    ///
    /// Without a server secret, or if the store cannot be read, this is empty
    /// and scrapers fall back to whatever the config file provides.
    pub fn api_keys(&self) -> ApiKeys {
        let key = match self.secret_key() {
            Ok(key) => key,
            Err(_) => return ApiKeys::default(),
        };
        match self.secrets.load(&key) {
            Ok(map) => ApiKeys {
                newsapi: map.get(NEWSAPI_API_KEY).filter(|v| !v.is_empty()).cloned(),
                crunchbase: map.get(CRUNCHBASE_API_KEY).filter(|v| !v.is_empty()).cloned(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored API keys");
                ApiKeys::default()
            }
        }
    }

    /// Run `sources` concurrently. An empty slice means every registered source.
    pub async fn run_sources(&self, sources: &[Source]) -> BatchReport {
        let sources = if sources.is_empty() {
            self.registry.sources()
        } else {
            sources.to_vec()
        };
        let ctx = self.clone();
        // secret file reads are blocking I/O
        let keys = tokio::task::spawn_blocking(move || ctx.api_keys())
            .await
            .unwrap_or_default();

        let inputs = BatchInputs {
            registry: Arc::clone(&self.registry),
            config: Arc::new(self.config.scrapers.clone()),
            keys,
            store: self.intel.clone(),
        };
        run_batch(inputs, &sources).await
    }
}
