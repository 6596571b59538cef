use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `settings_status` takes no arguments.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SettingsStatusParams {}
