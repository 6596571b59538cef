//! CLI `doctor` command: check the database, the secret store, and which
//! sources are ready to run.

use anyhow::{Context, Result};

use crate::config::CoachConfig;
use crate::db;
use crate::intel::types::Source;
use crate::scrapers::FailureKind;
use crate::secrets::{SecretKey, SecretStore, SecretsState};

pub fn doctor(config: &CoachConfig) -> Result<()> {
    println!("Coach Health Report");
    println!("===================");
    println!();

    database_section(config)?;
    println!();
    let secrets_ok = secrets_section(config)?;
    println!();
    sources_section(config, secrets_ok)?;
    Ok(())
}

fn database_section(config: &CoachConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    if !db_path.exists() {
        println!("Database:          not found at {}", db_path.display());
        println!("Run `coach scrape` or `coach serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("Journal mode:      {}", report.journal_mode);
    println!("Items:             {}", report.item_count);
    println!("Scrape runs:       {}", report.run_count);
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Export what is readable: coach intel export --output backup.json");
        println!("  2. Move the damaged file aside and re-run `coach scrape`.");
    }
    Ok(())
}

/// Returns whether stored settings are readable.
fn secrets_section(config: &CoachConfig) -> Result<bool> {
    let path = config.resolved_secrets_path();
    println!("Secrets file:      {}", path.display());

    let key = match SecretKey::from_config(config.security.secret_key.as_deref()) {
        Ok(key) => key,
        Err(_) => {
            println!("Secret key:        NOT SET (export COACH_SECRET_KEY)");
            return Ok(false);
        }
    };
    println!("Secret key:        set");

    match SecretStore::new(&path).inspect(&key)? {
        SecretsState::Missing => {
            println!("Status:            no settings saved yet");
            Ok(true)
        }
        SecretsState::Loaded(map) => {
            println!("Status:            OK ({} setting(s))", map.len());
            Ok(true)
        }
        SecretsState::Undecryptable(reason) => {
            println!("Status:            UNREADABLE ({reason})");
            println!("  The key may have been rotated. Settings read as empty until");
            println!("  the old key is restored or the settings are saved again.");
            Ok(false)
        }
    }
}

fn sources_section(config: &CoachConfig, secrets_ok: bool) -> Result<()> {
    let ctx = super::open_context(config)?;
    let keys = if secrets_ok {
        ctx.api_keys()
    } else {
        Default::default()
    };

    println!("Sources:");
    for source in Source::ALL {
        let status = match ctx.registry.build(source, &config.scrapers, &keys) {
            Ok(_) => "ready".to_string(),
            Err(e) => match e.kind() {
                FailureKind::Configuration => format!("not configured ({e})"),
                _ => format!("error ({e})"),
            },
        };
        println!("  {:<16} {status}", source.as_str());
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
