//! Source → constructor table.

use std::collections::BTreeMap;

use super::arxiv::ArxivScraper;
use super::crunchbase::CrunchbaseScraper;
use super::devto::DevtoScraper;
use super::hackernews::HackerNewsScraper;
use super::newsapi::NewsApiScraper;
use super::reddit::RedditScraper;
use super::rss::RssScraper;
use super::{Scraper, ScraperError};
use crate::config::ScrapersConfig;
use crate::intel::types::Source;

/// API keys resolved outside the config file (e.g. from the secret store).
/// A key here is used only when the config leaves it unset.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub newsapi: Option<String>,
    pub crunchbase: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("newsapi", &self.newsapi.as_ref().map(|_| "<redacted>"))
            .field("crunchbase", &self.crunchbase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub type ScraperFactory =
    fn(&ScrapersConfig, &ApiKeys) -> Result<Box<dyn Scraper>, ScraperError>;

pub struct ScraperRegistry {
    factories: BTreeMap<Source, ScraperFactory>,
}

/// The configured key wins unless it is unset or blank.
fn resolve_key(configured: Option<String>, stored: &Option<String>) -> Option<String> {
    configured
        .filter(|key| !key.trim().is_empty())
        .or_else(|| stored.clone())
}

impl Default for ScraperRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Source::Arxiv, |cfg, _| {
            Ok(Box::new(ArxivScraper::new(cfg.arxiv.clone(), cfg.http.clone())))
        });
        registry.register(Source::Reddit, |cfg, _| {
            Ok(Box::new(RedditScraper::new(cfg.reddit.clone(), cfg.http.clone())?))
        });
        registry.register(Source::Newsapi, |cfg, keys| {
            let mut config = cfg.newsapi.clone();
            config.api_key = resolve_key(config.api_key, &keys.newsapi);
            Ok(Box::new(NewsApiScraper::new(config, cfg.http.clone())?))
        });
        registry.register(Source::Devto, |cfg, _| {
            Ok(Box::new(DevtoScraper::new(cfg.devto.clone(), cfg.http.clone())))
        });
        registry.register(Source::Crunchbase, |cfg, keys| {
            let mut config = cfg.crunchbase.clone();
            config.api_key = resolve_key(config.api_key, &keys.crunchbase);
            Ok(Box::new(CrunchbaseScraper::new(config, cfg.http.clone())?))
        });
        registry.register(Source::Hackernews, |cfg, _| {
            Ok(Box::new(HackerNewsScraper::new(
                cfg.hackernews.clone(),
                cfg.http.clone(),
            )))
        });
        registry.register(Source::Rss, |cfg, _| {
            Ok(Box::new(RssScraper::new(cfg.rss.clone(), cfg.http.clone())))
        });
        registry
    }
}

impl ScraperRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register (or replace) the constructor for `source`.
    pub fn register(&mut self, source: Source, factory: ScraperFactory) {
        self.factories.insert(source, factory);
    }

    /// Sources with a registered connector, in stable order.
    pub fn sources(&self) -> Vec<Source> {
        self.factories.keys().copied().collect()
    }

    pub fn supports(&self, source: Source) -> bool {
        self.factories.contains_key(&source)
    }

    /// # Errors
    ///
    /// [`ScraperError::UnsupportedSource`] when nothing is registered for
    /// `source`; otherwise whatever the constructor reports, typically
    /// [`ScraperError::Configuration`].
    pub fn build(
        &self,
        source: Source,
        config: &ScrapersConfig,
        keys: &ApiKeys,
    ) -> Result<Box<dyn Scraper>, ScraperError> {
        let factory = self
            .factories
            .get(&source)
            .ok_or(ScraperError::UnsupportedSource(source))?;
        factory(config, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_all_but_github_trending() {
        let registry = ScraperRegistry::default();
        assert_eq!(registry.sources().len(), Source::ALL.len() - 1);
        assert!(!registry.supports(Source::GithubTrending));
        assert!(matches!(
            registry.build(
                Source::GithubTrending,
                &ScrapersConfig::default(),
                &ApiKeys::default()
            ),
            Err(ScraperError::UnsupportedSource(Source::GithubTrending))
        ));
    }

    #[test]
    fn keyless_sources_build_with_defaults() {
        let registry = ScraperRegistry::default();
        let config = ScrapersConfig::default();
        for source in [Source::Arxiv, Source::Reddit, Source::Devto, Source::Hackernews, Source::Rss] {
            let scraper = registry.build(source, &config, &ApiKeys::default()).unwrap();
            assert_eq!(scraper.source(), source);
        }
    }

    #[test]
    fn stored_keys_fill_missing_config_keys() {
        let registry = ScraperRegistry::default();
        let config = ScrapersConfig::default();
        assert!(matches!(
            registry.build(Source::Newsapi, &config, &ApiKeys::default()),
            Err(ScraperError::Configuration { .. })
        ));

        let keys = ApiKeys {
            newsapi: Some("stored".into()),
            crunchbase: Some("stored".into()),
        };
        assert!(registry.build(Source::Newsapi, &config, &keys).is_ok());
        assert!(registry.build(Source::Crunchbase, &config, &keys).is_ok());
    }

    #[test]
    fn blank_config_key_does_not_hide_stored_key() {
        let registry = ScraperRegistry::default();
        let mut config = ScrapersConfig::default();
        config.newsapi.api_key = Some(String::new());
        config.crunchbase.api_key = Some("   ".into());
        let keys = ApiKeys {
            newsapi: Some("stored-key".into()),
            crunchbase: Some("stored-key".into()),
        };
        assert!(registry.build(Source::Newsapi, &config, &keys).is_ok());
        assert!(registry.build(Source::Crunchbase, &config, &keys).is_ok());

        assert_eq!(
            resolve_key(Some("from-config".into()), &Some("stored".into())).as_deref(),
            Some("from-config")
        );
        assert_eq!(resolve_key(Some(" ".into()), &None), None);
    }

    #[test]
    fn api_keys_debug_is_redacted() {
        let keys = ApiKeys {
            newsapi: Some("abc123".into()),
            crunchbase: None,
        };
        assert!(!format!("{keys:?}").contains("abc123"));
    }
}
