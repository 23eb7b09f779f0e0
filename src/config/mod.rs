//! Configuration loading and management
//!
//! A single TOML file at `~/.questlog/config.toml`:
//!
//! ```toml
//! [settings]
//! log_level = "info"
//! onboarding_complete = true
//! theme = "dark"
//! categories = ["General", "Work", "Study", "Health", "Personal"]
//! default_category = "General"
//! ```

mod io;
mod settings;

pub use settings::Settings;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Resolved database location
    pub fn database_path(&self) -> PathBuf {
        match &self.settings.database_path {
            Some(path) => expand_home(path),
            None => Self::global_config_dir().join("questlog.db"),
        }
    }

    /// Category for a new quest.
    ///
    /// Matches case-insensitively against the configured list; no request
    /// picks the default. Returns None for an unknown category.
    pub fn resolve_category(&self, requested: Option<&str>) -> Option<String> {
        match requested {
            Some(wanted) => self
                .settings
                .categories
                .iter()
                .find(|c| c.eq_ignore_ascii_case(wanted.trim()))
                .cloned(),
            None => Some(self.settings.default_category.clone()),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}
