//! User-editable settings backed by the encrypted [`SecretStore`].
//!
//! Reads go out as a [`SettingsView`], which carries only "is set" flags and
//! hints for secret values. Writes come in as a [`SettingsUpdate`]: absent
//! fields are left alone and `""` clears a field.

use serde::{Deserialize, Serialize};

use crate::secrets::{SecretKey, SecretMap, SecretStatus, SecretStore, SecretsError};

pub const LLM_PROVIDER: &str = "llm_provider";
pub const LLM_API_KEY: &str = "llm_api_key";
pub const NEWSAPI_API_KEY: &str = "newsapi_api_key";
pub const CRUNCHBASE_API_KEY: &str = "crunchbase_api_key";

/// Setting names accepted by the CLI and the update endpoint.
pub const KNOWN_SETTINGS: [&str; 4] = [LLM_PROVIDER, LLM_API_KEY, NEWSAPI_API_KEY, CRUNCHBASE_API_KEY];

/// Which settings may be echoed back verbatim.
pub fn is_secret(name: &str) -> bool {
    name != LLM_PROVIDER
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsView {
    pub llm_provider: Option<String>,
    pub llm_api_key_set: bool,
    pub llm_api_key_hint: Option<String>,
    pub newsapi_api_key_set: bool,
    pub newsapi_api_key_hint: Option<String>,
    pub crunchbase_api_key_set: bool,
    pub crunchbase_api_key_hint: Option<String>,
}

impl SettingsView {
    pub fn from_map(map: &SecretMap) -> Self {
        let status = |name: &str| SecretStatus::from_value(map.get(name).map(String::as_str));
        let llm = status(LLM_API_KEY);
        let newsapi = status(NEWSAPI_API_KEY);
        let crunchbase = status(CRUNCHBASE_API_KEY);
        Self {
            llm_provider: map.get(LLM_PROVIDER).filter(|v| !v.is_empty()).cloned(),
            llm_api_key_set: llm.is_set,
            llm_api_key_hint: llm.hint,
            newsapi_api_key_set: newsapi.is_set,
            newsapi_api_key_hint: newsapi.hint,
            crunchbase_api_key_set: crunchbase.is_set,
            crunchbase_api_key_hint: crunchbase.hint,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    pub llm_provider: Option<String>,
    pub llm_api_key: Option<String>,
    pub newsapi_api_key: Option<String>,
    pub crunchbase_api_key: Option<String>,
}

impl SettingsUpdate {
    fn fields(&self) -> [(&'static str, Option<&String>); 4] {
        [
            (LLM_PROVIDER, self.llm_provider.as_ref()),
            (LLM_API_KEY, self.llm_api_key.as_ref()),
            (NEWSAPI_API_KEY, self.newsapi_api_key.as_ref()),
            (CRUNCHBASE_API_KEY, self.crunchbase_api_key.as_ref()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    /// Merge into `map`. Returns the names that changed.
    pub fn apply_to(&self, map: &mut SecretMap) -> Vec<&'static str> {
        let mut changed = Vec::new();
        for (name, value) in self.fields() {
            let Some(value) = value else { continue };
            let value = value.trim();
            let did_change = if value.is_empty() {
                map.remove(name).is_some()
            } else {
                map.insert(name.to_string(), value.to_string()).as_deref() != Some(value)
            };
            if did_change {
                changed.push(name);
            }
        }
        changed
    }
}

pub fn read_settings(store: &SecretStore, key: &SecretKey) -> Result<SettingsView, SecretsError> {
    Ok(SettingsView::from_map(&store.load(key)?))
}

/// Apply `update` in one read-modify-write cycle and return the new view.
pub fn apply_update(
    store: &SecretStore,
    key: &SecretKey,
    update: &SettingsUpdate,
) -> Result<SettingsView, SecretsError> {
    let mut view = None;
    store.update(key, |map| {
        let changed = update.apply_to(map);
        tracing::info!(changed = ?changed, "settings updated");
        view = Some(SettingsView::from_map(map));
    })?;
    // update() always runs the closure before returning Ok
    Ok(view.unwrap_or_else(|| SettingsView::from_map(&SecretMap::new())))
}
