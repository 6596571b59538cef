use coach_intel::config::{
    ArxivConfig, CoachConfig, HttpConfig, NewsApiConfig, RedditConfig,
};
use coach_intel::intel::types::Source;
use coach_intel::scrapers::arxiv::ArxivScraper;
use coach_intel::scrapers::newsapi::NewsApiScraper;
use coach_intel::scrapers::reddit::RedditScraper;
use coach_intel::scrapers::{ApiKeys, FailureKind, ScraperRegistry};

#[test]
fn arxiv_defaults_cover_ai_and_ml() {
    let scraper = ArxivScraper::new(ArxivConfig::default(), HttpConfig::default());
    let categories = &scraper.config().categories;
    assert!(categories.iter().any(|c| c == "cs.AI"));
    assert!(categories.iter().any(|c| c == "cs.LG"));
}

#[test]
fn reddit_defaults_include_startups() {
    let scraper = RedditScraper::new(RedditConfig::default(), HttpConfig::default()).unwrap();
    assert!(scraper.config().subreddits.iter().any(|s| s == "startups"));
}

#[test]
fn newsapi_defaults_include_startup_funding() {
    assert!(NewsApiConfig::default()
        .queries
        .iter()
        .any(|q| q == "startup funding"));
}

#[test]
fn overrides_replace_default_lists() {
    let config: CoachConfig = toml::from_str(
        r#"
        [scrapers.arxiv]
        categories = ["q-fin.GN"]

        [scrapers.reddit]
        subreddits = ["rust"]
        timeframe = "week"

        [scrapers.newsapi]
        queries = ["robotics"]
        "#,
    )
    .unwrap();

    assert_eq!(config.scrapers.arxiv.categories, vec!["q-fin.GN".to_string()]);
    assert_eq!(config.scrapers.reddit.subreddits, vec!["rust".to_string()]);
    assert_eq!(config.scrapers.reddit.timeframe, "week");
    assert_eq!(config.scrapers.newsapi.queries, vec!["robotics".to_string()]);
    // untouched fields keep their defaults
    assert_eq!(
        config.scrapers.arxiv.max_results,
        ArxivConfig::default().max_results
    );
}

#[test]
fn newsapi_keeps_days_back_and_default_queries() {
    let config = NewsApiConfig {
        api_key: Some("test_key".into()),
        days_back: 3,
        ..Default::default()
    };
    let scraper = NewsApiScraper::new(config, HttpConfig::default()).unwrap();

    assert_eq!(scraper.config().days_back, 3);
    assert_eq!(scraper.config().queries, NewsApiConfig::default().queries);
}

#[test]
fn newsapi_without_key_is_a_configuration_error() {
    let err = NewsApiScraper::new(NewsApiConfig::default(), HttpConfig::default())
        .err()
        .unwrap();
    assert_eq!(err.kind(), FailureKind::Configuration);
}

#[test]
fn registry_fills_keys_from_settings() {
    let registry = ScraperRegistry::default();
    let config = CoachConfig::default();

    assert!(registry
        .build(Source::Crunchbase, &config.scrapers, &ApiKeys::default())
        .is_err());

    let keys = ApiKeys {
        newsapi: Some("news-key".into()),
        crunchbase: Some("cb-key".into()),
    };
    assert!(registry.build(Source::Crunchbase, &config.scrapers, &keys).is_ok());
    assert!(registry.build(Source::Newsapi, &config.scrapers, &keys).is_ok());
}
