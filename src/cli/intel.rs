//! CLI `intel` commands: list, stats, export.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use crate::config::CoachConfig;
use crate::intel::types::{IntelQuery, IntelligenceRecord};

/// Print matching records, one block per item.
pub fn list(config: &CoachConfig, query: &IntelQuery) -> Result<()> {
    let ctx = super::open_context(config)?;
    let records = ctx.intel.query(query)?;

    if records.is_empty() {
        println!("No intel found.");
        return Ok(());
    }

    println!("{} item(s)\n", records.len());
    for (i, record) in records.iter().enumerate() {
        let score = record
            .score
            .map(|s| format!(" (score: {s})"))
            .unwrap_or_default();
        println!(
            "  {}. [{}] {}{score}",
            i + 1,
            record.source,
            super::preview(&record.title, 100)
        );
        println!("     {}", record.url);
        if !record.summary.is_empty() {
            println!("     {}", super::preview(&record.summary, 140));
        }
        println!("     fetched {}", record.fetched_at.format("%Y-%m-%d %H:%M"));
        println!();
    }
    Ok(())
}

/// Display store statistics in the terminal.
pub fn stats(config: &CoachConfig, runs: usize) -> Result<()> {
    let ctx = super::open_context(config)?;
    let stats = ctx.intel.stats(runs)?;

    println!("Intel Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total items:         {}", stats.total_items);
    println!();

    println!("By Source:");
    for (source, count) in &stats.by_source {
        println!("  {source:<16} {count}");
    }
    println!();

    if let Some(ref oldest) = stats.oldest_fetch {
        println!("Oldest fetch:          {oldest}");
    }
    if let Some(ref newest) = stats.newest_fetch {
        println!("Newest fetch:          {newest}");
    }

    if !stats.recent_runs.is_empty() {
        println!();
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            match &run.error {
                Some(error) => println!(
                    "  {}  {:<12} {}  {}",
                    run.finished_at,
                    run.source,
                    run.status.as_str(),
                    super::preview(error, 80)
                ),
                None => println!(
                    "  {}  {:<12} {}  +{} new, {} dupes, {} skipped",
                    run.finished_at,
                    run.source,
                    run.status.as_str(),
                    run.new_items,
                    run.duplicates,
                    run.failed
                ),
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ExportData {
    exported_at: String,
    count: usize,
    items: Vec<IntelligenceRecord>,
}

/// Export matching records as JSON, to `output` or stdout.
pub fn export(config: &CoachConfig, query: &IntelQuery, output: Option<&Path>) -> Result<()> {
    let ctx = super::open_context(config)?;
    let items = ctx.intel.query(query)?;

    let data = ExportData {
        exported_at: Utc::now().to_rfc3339(),
        count: items.len(),
        items,
    };
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            super::write_atomic(path, json.as_bytes())?;
            eprintln!("Exported {} item(s) to {}", data.count, path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
