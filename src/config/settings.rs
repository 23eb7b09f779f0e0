//! Settings configuration types

use serde::{Deserialize, Serialize};

use crate::domain::AppTheme;

/// General settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Database location. Defaults to `~/.questlog/questlog.db` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,

    /// Log filter used when RUST_LOG is not set (e.g. "info", "questlog=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Set once a profile has been created; cleared by a full reset
    #[serde(default)]
    pub onboarding_complete: bool,

    /// Selected presentation theme
    #[serde(default)]
    pub theme: AppTheme,

    /// Categories offered when adding a quest
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_categories() -> Vec<String> {
    ["General", "Work", "Study", "Health", "Personal"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_category() -> String {
    "General".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level(),
            onboarding_complete: false,
            theme: AppTheme::default(),
            categories: default_categories(),
            default_category: default_category(),
        }
    }
}
