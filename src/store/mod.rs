//! Entity storage
//!
//! The engine only needs a generic durable store of the three entity kinds.
//! Writes are collected into a [`WriteBatch`] and handed to
//! [`EntityStore::apply`], which makes the whole batch durable in one
//! transaction or none of it. Nothing is staged on the store between calls,
//! so components sharing one store cannot commit or discard each other's work.
//!
//! # Backends
//!
//! - [`SqliteStore`]: durable, one table per kind (`~/.questlog/questlog.db`)
//! - [`MemoryStore`]: in-process, with commit failure injection

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::{Challenge, EntityKind, Quest, User};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("commit rejected: {0}")]
    CommitRejected(String),

    #[error("database schema version {0} is newer than this build supports")]
    UnsupportedSchema(i64),
}

/// Ordering for [`EntityStore::fetch_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Insertion order
    #[default]
    Unsorted,
    /// Ascending by the entity's date, ties in insertion order
    DateAscending,
}

/// A persistable entity
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    /// Timestamp used by [`SortOrder::DateAscending`]
    fn sort_date(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for Quest {
    const KIND: EntityKind = EntityKind::Quest;

    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_date(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}

impl Entity for Challenge {
    const KIND: EntityKind = EntityKind::Challenge;

    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_date(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}

/// One write inside a [`WriteBatch`]
#[derive(Debug, Clone)]
pub(crate) enum WriteOp {
    Insert(Row),
    Update(Row),
    Delete { kind: EntityKind, id: Uuid },
    DeleteAll(EntityKind),
}

/// Serialized entity as the backends store it
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub kind: EntityKind,
    pub id: Uuid,
    pub date_ms: Option<i64>,
    pub body: String,
}

impl Row {
    fn of<E: Entity>(entity: &E) -> Result<Self, StoreError> {
        Ok(Self {
            kind: E::KIND,
            id: entity.id(),
            date_ms: entity.sort_date().map(|d| d.timestamp_millis()),
            body: serde_json::to_string(entity)?,
        })
    }
}

/// Ordered set of writes applied as one transaction
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new entity
    pub fn insert<E: Entity>(&mut self, entity: &E) -> Result<&mut Self, StoreError> {
        self.ops.push(WriteOp::Insert(Row::of(entity)?));
        Ok(self)
    }

    /// Replace an existing entity. Applying fails with `NotFound` if it is absent.
    pub fn update<E: Entity>(&mut self, entity: &E) -> Result<&mut Self, StoreError> {
        self.ops.push(WriteOp::Update(Row::of(entity)?));
        Ok(self)
    }

    /// Remove one entity. Applying fails with `NotFound` if it is absent.
    pub fn delete<E: Entity>(&mut self, id: Uuid) -> &mut Self {
        self.ops.push(WriteOp::Delete { kind: E::KIND, id });
        self
    }

    /// Remove every entity of `kind`
    pub fn delete_all(&mut self, kind: EntityKind) -> &mut Self {
        self.ops.push(WriteOp::DeleteAll(kind));
        self
    }

    /// Append the writes of `other` after this batch's writes
    pub fn extend(&mut self, other: WriteBatch) -> &mut Self {
        self.ops.extend(other.ops);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether any write in the batch targets `kind`
    pub fn touches(&self, kind: EntityKind) -> bool {
        self.ops.iter().any(|op| match op {
            WriteOp::Insert(row) | WriteOp::Update(row) => row.kind == kind,
            WriteOp::Delete { kind: k, .. } | WriteOp::DeleteAll(k) => *k == kind,
        })
    }

    pub(crate) fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}

/// Durable key/entity store with atomic write batches
pub trait EntityStore: Send + Sync {
    /// Fetch every committed entity of kind `E`
    fn fetch_all<E: Entity>(&self, order: SortOrder) -> Result<Vec<E>, StoreError>;

    /// Make every write in `batch` durable as one transaction.
    ///
    /// On any error nothing in the batch is applied. Returns the number of
    /// rows written or removed.
    fn apply(&self, batch: WriteBatch) -> Result<usize, StoreError>;

    /// Push committed writes out to durable storage
    fn flush(&self) -> Result<(), StoreError>;
}

/// Apply a batch holding a single update
pub fn save<S: EntityStore + ?Sized, E: Entity>(store: &S, entity: &E) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    batch.update(entity)?;
    store.apply(batch)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;

    #[test]
    fn test_batch_tracks_touched_kinds() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());

        batch.insert(&User::new("Ana", "fox")).unwrap();
        batch.delete::<Quest>(Uuid::new_v4());
        assert_eq!(batch.len(), 2);
        assert!(batch.touches(EntityKind::User));
        assert!(batch.touches(EntityKind::Quest));
        assert!(!batch.touches(EntityKind::Challenge));

        let mut other = WriteBatch::new();
        other.delete_all(EntityKind::Challenge);
        batch.extend(other);
        assert!(batch.touches(EntityKind::Challenge));
    }
}
