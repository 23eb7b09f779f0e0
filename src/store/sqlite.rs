//! SQLite entity store
//!
//! Each entity kind lives in its own table as a JSON body plus the columns
//! needed for ordering. Every [`WriteBatch`] runs in its own transaction while
//! the connection lock is held.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, params};

use super::{Entity, EntityStore, SortOrder, StoreError, WriteBatch, WriteOp};
use crate::domain::EntityKind;

/// Newest schema version this build understands
const SCHEMA_VERSION: i64 = 2;

/// Database wrapper shared by all components
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Quest => "quests",
        EntityKind::Challenge => "challenges",
    }
}

impl SqliteStore {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        tracing::debug!("Entity store schema ready");
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("Entity store lock poisoned")
    }

    /// Current schema version recorded in the database
    pub fn schema_version(&self) -> Result<i64, StoreError> {
        let conn = self.conn();
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )?;
        Ok(version)
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<(), StoreError> {
        let version = self.schema_version()?;
        if version > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema(version));
        }

        let conn = self.conn();

        // Migration 2: date indexes for sorted fetches
        if version < 2 {
            conn.execute_batch(
                r#"
                CREATE INDEX IF NOT EXISTS idx_quest_date ON quests(date_ms);
                CREATE INDEX IF NOT EXISTS idx_challenge_date ON challenges(date_ms);
                "#,
            )?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
            tracing::info!("Migrated entity store to schema version 2");
        }

        Ok(())
    }
}

fn apply_op(tx: &Transaction<'_>, op: &WriteOp) -> Result<usize, StoreError> {
    match op {
        WriteOp::Insert(row) => {
            let sql = format!(
                "INSERT INTO {} (id, date_ms, body) VALUES (?1, ?2, ?3)",
                table(row.kind)
            );
            Ok(tx.execute(&sql, params![row.id.to_string(), row.date_ms, row.body])?)
        }
        WriteOp::Update(row) => {
            let sql = format!(
                "UPDATE {} SET date_ms = ?2, body = ?3 WHERE id = ?1",
                table(row.kind)
            );
            let changed = tx.execute(&sql, params![row.id.to_string(), row.date_ms, row.body])?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    kind: row.kind,
                    id: row.id,
                });
            }
            Ok(changed)
        }
        WriteOp::Delete { kind, id } => {
            let sql = format!("DELETE FROM {} WHERE id = ?1", table(*kind));
            let changed = tx.execute(&sql, params![id.to_string()])?;
            if changed == 0 {
                return Err(StoreError::NotFound { kind: *kind, id: *id });
            }
            Ok(changed)
        }
        WriteOp::DeleteAll(kind) => Ok(tx.execute(&format!("DELETE FROM {}", table(*kind)), [])?),
    }
}

impl EntityStore for SqliteStore {
    fn fetch_all<E: Entity>(&self, order: SortOrder) -> Result<Vec<E>, StoreError> {
        let order_by = match order {
            SortOrder::Unsorted => "rowid",
            SortOrder::DateAscending => "date_ms, rowid",
        };
        let sql = format!("SELECT body FROM {} ORDER BY {}", table(E::KIND), order_by);

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    fn apply(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn();
        // Dropping the transaction without commit rolls it back
        let tx = conn.transaction()?;
        let mut changed = 0;
        for op in batch.ops() {
            changed += apply_op(&tx, op)?;
        }

        if let Err(e) = tx.commit() {
            tracing::warn!("Commit of {} writes failed: {}", batch.len(), e);
            return Err(e.into());
        }
        Ok(changed)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))?;
        Ok(())
    }
}

/// SQL schema for the entity database (version 1)
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    date_ms INTEGER,
    body TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quests (
    id TEXT PRIMARY KEY,
    date_ms INTEGER,
    body TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS challenges (
    id TEXT PRIMARY KEY,
    date_ms INTEGER,
    body TEXT NOT NULL
);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
