//! CLI `settings` commands over the encrypted secret store.

use anyhow::{bail, Result};

use crate::config::CoachConfig;
use crate::secrets::{mask_secret, SecretStore};
use crate::settings::{self as coach_settings, is_secret, KNOWN_SETTINGS};

fn check_name(name: &str) -> Result<()> {
    if !KNOWN_SETTINGS.contains(&name) {
        bail!(
            "unknown setting '{name}' (expected one of: {})",
            KNOWN_SETTINGS.join(", ")
        );
    }
    Ok(())
}

fn store(config: &CoachConfig) -> SecretStore {
    SecretStore::new(config.resolved_secrets_path())
}

/// Print the masked settings view.
pub fn show(config: &CoachConfig) -> Result<()> {
    let key = crate::secrets::SecretKey::from_config(config.security.secret_key.as_deref())?;
    let view = coach_settings::read_settings(&store(config), &key)?;

    let status = |set: bool, hint: &Option<String>| match (set, hint) {
        (true, Some(hint)) => format!("set ({hint})"),
        (true, None) => "set".to_string(),
        (false, _) => "not set".to_string(),
    };

    println!("Settings");
    println!("{}", "=".repeat(40));
    println!(
        "  llm_provider:        {}",
        view.llm_provider.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  llm_api_key:         {}",
        status(view.llm_api_key_set, &view.llm_api_key_hint)
    );
    println!(
        "  newsapi_api_key:     {}",
        status(view.newsapi_api_key_set, &view.newsapi_api_key_hint)
    );
    println!(
        "  crunchbase_api_key:  {}",
        status(view.crunchbase_api_key_set, &view.crunchbase_api_key_hint)
    );
    Ok(())
}

pub fn set(config: &CoachConfig, name: &str, value: &str) -> Result<()> {
    check_name(name)?;
    let key = crate::secrets::SecretKey::from_config(config.security.secret_key.as_deref())?;
    let store = store(config);
    if value.is_empty() {
        store.delete(&key, name)?;
        println!("Cleared {name}.");
    } else {
        store.set(&key, name, value)?;
        println!("Saved {name}.");
    }
    Ok(())
}

/// Print one setting. Secret values are masked unless `reveal` is set.
pub fn get(config: &CoachConfig, name: &str, reveal: bool) -> Result<()> {
    check_name(name)?;
    let key = crate::secrets::SecretKey::from_config(config.security.secret_key.as_deref())?;
    match store(config).get(&key, name)? {
        Some(value) if reveal || !is_secret(name) => println!("{value}"),
        Some(value) => println!("{}", mask_secret(&value)),
        None => println!("(not set)"),
    }
    Ok(())
}

pub fn delete(config: &CoachConfig, name: &str) -> Result<()> {
    check_name(name)?;
    let key = crate::secrets::SecretKey::from_config(config.security.secret_key.as_deref())?;
    if store(config).delete(&key, name)? {
        println!("Deleted {name}.");
    } else {
        println!("{name} was not set.");
    }
    Ok(())
}
