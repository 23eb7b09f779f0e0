//! CLI command implementations

pub mod challenge;
pub mod init;
pub mod profile;
pub mod quest;
pub mod reset;
pub mod theme;

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use uuid::Uuid;

use questlog::config::Config;
use questlog::store::SqliteStore;
use questlog::QuestLog;

/// Loaded config plus the opened engine
pub struct Session {
    pub config_path: PathBuf,
    pub config: Config,
    pub app: QuestLog<SqliteStore>,
}

impl Session {
    /// Open the database named by `db_override` or the config
    pub fn open(config_path: PathBuf, config: Config, db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = db_override.unwrap_or_else(|| config.database_path());
        tracing::debug!("Opening database {}", db_path.display());

        let app = QuestLog::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        Ok(Self {
            config_path,
            config,
            app,
        })
    }

    pub fn save_config(&self) -> Result<()> {
        self.config.save_to_file(&self.config_path)
    }
}

/// Resolve a full id or an unambiguous prefix against `ids`
pub fn resolve_id(input: &str, ids: impl IntoIterator<Item = Uuid>, what: &str) -> Result<Uuid> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        bail!("Empty {} id", what);
    }

    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("No {} matches '{}'", what, input),
        _ => bail!("'{}' matches {} {}s, use a longer prefix", input, matches.len(), what),
    }
}

/// First eight characters of an id, as shown in listings
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}
