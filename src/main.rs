mod api;
mod cli;
mod config;
mod context;
mod db;
mod intel;
mod scrapers;
mod secrets;
mod server;
mod settings;
mod tools;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use intel::types::{IntelQuery, SortOrder, Source};

#[derive(Parser)]
#[command(name = "coach", version, about = "Startup and AI intelligence collector for the coach backend")]
struct Cli {
    /// Config file (defaults to ~/.coach/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Start the JSON API and MCP over HTTP
    ServeHttp,
    /// Run scrapers once and store new items
    Scrape {
        /// Sources to run; all registered sources when omitted
        #[arg(value_parser = parse_source)]
        sources: Vec<Source>,
    },
    /// Read stored intelligence
    Intel {
        #[command(subcommand)]
        action: IntelAction,
    },
    /// Manage encrypted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Check database, secrets, and source configuration
    Doctor,
}

#[derive(clap::Args)]
struct QueryArgs {
    #[arg(long, value_parser = parse_source)]
    source: Option<Source>,
    /// RFC 3339 lower bound on fetch time
    #[arg(long)]
    since: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on fetch time
    #[arg(long)]
    until: Option<DateTime<Utc>>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    oldest_first: bool,
}

impl QueryArgs {
    fn into_query(self) -> IntelQuery {
        IntelQuery {
            source: self.source,
            since: self.since,
            until: self.until,
            limit: self.limit,
            order: if self.oldest_first {
                SortOrder::Oldest
            } else {
                SortOrder::Newest
            },
        }
    }
}

#[derive(Subcommand)]
enum IntelAction {
    /// List stored items
    List(QueryArgs),
    /// Show counts per source and recent runs
    Stats {
        #[arg(long, default_value_t = 10)]
        runs: usize,
    },
    /// Export items as JSON
    Export {
        #[command(flatten)]
        query: QueryArgs,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show which settings are configured (values masked)
    Show,
    /// Store a setting; an empty value clears it
    Set { name: String, value: String },
    /// Print one setting
    Get {
        name: String,
        /// Print secret values in full
        #[arg(long)]
        reveal: bool,
    },
    /// Remove a setting
    Delete { name: String },
}

fn parse_source(s: &str) -> Result<Source, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::CoachConfig::load_from(path)?,
        None => config::CoachConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve_stdio(config).await?,
        Command::ServeHttp => server::serve_http(config).await?,
        Command::Scrape { sources } => cli::scrape::scrape(&config, &sources).await?,
        Command::Intel { action } => match action {
            IntelAction::List(args) => cli::intel::list(&config, &args.into_query())?,
            IntelAction::Stats { runs } => cli::intel::stats(&config, runs)?,
            IntelAction::Export { query, output } => {
                cli::intel::export(&config, &query.into_query(), output.as_deref())?
            }
        },
        Command::Settings { action } => match action {
            SettingsAction::Show => cli::settings::show(&config)?,
            SettingsAction::Set { name, value } => cli::settings::set(&config, &name, &value)?,
            SettingsAction::Get { name, reveal } => cli::settings::get(&config, &name, reveal)?,
            SettingsAction::Delete { name } => cli::settings::delete(&config, &name)?,
        },
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
