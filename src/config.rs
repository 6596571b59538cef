use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CoachConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub scrapers: ScrapersConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub secrets_path: String,
}

/// Key material for the encrypted settings file. Usually supplied through
/// `COACH_SECRET_KEY` rather than written into the config file.
#[derive(Deserialize, Clone, Default)]
#[serde(default)]
pub struct SecurityConfig {
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScrapersConfig {
    pub http: HttpConfig,
    pub arxiv: ArxivConfig,
    pub reddit: RedditConfig,
    pub newsapi: NewsApiConfig,
    pub devto: DevtoConfig,
    pub crunchbase: CrunchbaseConfig,
    pub hackernews: HackerNewsConfig,
    pub rss: RssConfig,
}

/// Settings shared by every scraper's HTTP session.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ArxivConfig {
    pub base_url: String,
    pub categories: Vec<String>,
    pub max_results: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RedditConfig {
    pub base_url: String,
    pub subreddits: Vec<String>,
    /// One of `hour`, `day`, `week`, `month`, `year`, `all`.
    pub timeframe: String,
    pub limit: usize,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct NewsApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub queries: Vec<String>,
    pub page_size: usize,
    pub days_back: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DevtoConfig {
    pub base_url: String,
    pub per_page: usize,
    /// Top articles of the last N days.
    pub top: u32,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct CrunchbaseConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HackerNewsConfig {
    pub base_url: String,
    pub max_results: usize,
    pub min_points: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RssConfig {
    pub feeds: Vec<String>,
    pub max_per_feed: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8420,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = default_coach_dir();
        Self {
            db_path: dir.join("intel.db").to_string_lossy().into_owned(),
            secrets_path: dir.join("secrets.enc").to_string_lossy().into_owned(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            backoff_base_ms: 500,
            user_agent: concat!("coach-intel/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org/api/query".into(),
            categories: vec!["cs.AI".into(), "cs.LG".into(), "cs.CL".into()],
            max_results: 50,
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".into(),
            subreddits: vec![
                "startups".into(),
                "Entrepreneur".into(),
                "SaaS".into(),
                "MachineLearning".into(),
            ],
            timeframe: "day".into(),
            limit: 25,
        }
    }
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".into(),
            api_key: None,
            queries: vec![
                "startup funding".into(),
                "AI startup".into(),
                "venture capital".into(),
            ],
            page_size: 20,
            days_back: 7,
        }
    }
}

impl std::fmt::Debug for NewsApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("queries", &self.queries)
            .field("page_size", &self.page_size)
            .field("days_back", &self.days_back)
            .finish()
    }
}

impl Default for DevtoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dev.to/api".into(),
            per_page: 30,
            top: 7,
        }
    }
}

impl Default for CrunchbaseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.crunchbase.com/api/v4".into(),
            api_key: None,
            limit: 25,
        }
    }
}

impl std::fmt::Debug for CrunchbaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrunchbaseConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("limit", &self.limit)
            .finish()
    }
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hn.algolia.com/api/v1".into(),
            max_results: 30,
            min_points: 50,
        }
    }
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            feeds: vec![
                "https://techcrunch.com/feed/".into(),
                "https://news.ycombinator.com/rss".into(),
            ],
            max_per_feed: 20,
        }
    }
}

/// Returns `~/.coach/`, or `./.coach` when no home directory is known.
/// An exported but empty variable counts as unset.
fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|val| !val.trim().is_empty())
}

pub fn default_coach_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".coach")
}

/// Returns the default config file path: `~/.coach/config.toml`
pub fn default_config_path() -> PathBuf {
    default_coach_dir().join("config.toml")
}

impl CoachConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CoachConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("COACH_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("COACH_SECRETS") {
            self.storage.secrets_path = val;
        }
        if let Ok(val) = std::env::var("COACH_SECRET_KEY") {
            self.security.secret_key = Some(val);
        }
        if let Ok(val) = std::env::var("COACH_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Some(val) = non_blank_env("NEWSAPI_API_KEY") {
            self.scrapers.newsapi.api_key = Some(val);
        }
        if let Some(val) = non_blank_env("CRUNCHBASE_API_KEY") {
            self.scrapers.crunchbase.api_key = Some(val);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_secrets_path(&self) -> PathBuf {
        expand_tilde(&self.storage.secrets_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
