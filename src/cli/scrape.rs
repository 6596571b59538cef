//! CLI `scrape` command: run scrapers once and print per-source counts.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::config::CoachConfig;
use crate::intel::types::Source;
use crate::scrapers::batch::{BatchReport, SourceOutcome};

pub async fn scrape(config: &CoachConfig, sources: &[Source]) -> Result<()> {
    let ctx = super::open_context(config)?;
    let label = if sources.is_empty() {
        "all sources".to_string()
    } else {
        sources
            .iter()
            .map(Source::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("  {spinner} {msg} ({elapsed})")?);
    pb.set_message(format!("scraping {label}"));
    pb.enable_steady_tick(Duration::from_millis(120));

    let report = ctx.run_sources(sources).await;
    pb.finish_and_clear();

    print_report(&report);
    if report.failures() > 0 && report.failures() == report.outcomes.len() {
        anyhow::bail!("every source failed");
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("Scrape Results");
    println!("{}", "=".repeat(60));
    println!(
        "  {:<12} {:>8} {:>8} {:>8} {:>8}",
        "source", "fetched", "new", "dupes", "skipped"
    );
    for outcome in &report.outcomes {
        match outcome {
            SourceOutcome::Completed(s) => println!(
                "  {:<12} {:>8} {:>8} {:>8} {:>8}",
                s.source.as_str(),
                s.fetched,
                s.new,
                s.duplicates,
                s.failed
            ),
            SourceOutcome::Failed {
                source,
                kind,
                message,
            } => println!("  {:<12} FAILED ({kind:?}): {message}", source.as_str()),
        }
    }
    println!();
    println!(
        "{} new item(s), {} failed source(s)",
        report.new_items(),
        report.failures()
    );
}
