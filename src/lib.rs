//! Intelligence collection and encrypted settings for a personal AI coach.
//!
//! `coach-intel` harvests startup and AI news from upstream sources into a
//! local SQLite store, and keeps user settings (LLM provider, API keys) in a
//! single encrypted file.
//!
//! | Source | Upstream | Needs key |
//! |--------|----------|-----------|
//! | `arxiv` | arXiv export API (Atom) | no |
//! | `reddit` | subreddit `top.json` listings | no |
//! | `newsapi` | NewsAPI `/v2/everything` | yes |
//! | `devto` | Dev.to articles API | no |
//! | `crunchbase` | Crunchbase v4 funding-round search | yes |
//! | `hackernews` | HN Algolia search | no |
//! | `rss` | any RSS 2.0 / Atom feed | no |
//!
//! Every item is normalized to an [`intel::types::IntelligenceRecord`] and
//! stored under a unique `(source, external_id)` key, so re-running a scraper
//! never duplicates rows.
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`intel`]: the record store, queries, and run log
//! - [`scrapers`]: the `Scraper` trait, the per-source connectors, and batch runs
//! - [`secrets`]: the encrypted settings file and secret masking
//! - [`settings`]: the masked settings view and partial updates
//! - [`context`]: the shared application context
//! - [`api`]: the JSON HTTP API

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod intel;
pub mod scrapers;
pub mod secrets;
pub mod settings;
