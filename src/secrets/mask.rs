//! Outward-facing views of secret values: "is it set" plus a short hint.

use serde::Serialize;

/// Number of trailing characters revealed by a hint.
const HINT_CHARS: usize = 4;

/// Masked view of one secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretStatus {
    pub is_set: bool,
    pub hint: Option<String>,
}

impl SecretStatus {
    pub fn from_value(value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => Self {
                is_set: true,
                hint: Some(mask_secret(v)),
            },
            None => Self {
                is_set: false,
                hint: None,
            },
        }
    }
}

/// `"..."` followed by the last four characters, or just `"..."` for values
/// too short to reveal anything safely.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= HINT_CHARS {
        return "...".to_string();
    }
    let tail: String = chars[chars.len() - HINT_CHARS..].iter().collect();
    format!("...{tail}")
}
