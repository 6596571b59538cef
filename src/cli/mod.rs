pub mod doctor;
pub mod intel;
pub mod scrape;
pub mod settings;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::config::CoachConfig;
use crate::context::AppContext;

/// Open the stores for a one-shot command.
pub(crate) fn open_context(config: &CoachConfig) -> Result<AppContext> {
    AppContext::from_config(config.clone())
}

/// Write `bytes` to `dest` via a uniquely named sibling temp file and rename.
pub(crate) fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes).context("error writing to file")?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to move export into place at {}", dest.display()))?;
    Ok(())
}

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub(crate) fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("short", 10), "short");
    }

    #[test]
    fn write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("export.json");
        write_atomic(&dest, b"first").unwrap();
        write_atomic(&dest, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "second");
        let entries = std::fs::read_dir(dest.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1, "no temp files left behind");
    }
}
