//! In-process entity store
//!
//! Keeps one committed copy of every table. A batch is applied to a scratch
//! copy and swapped in only when every write succeeded. Used by tests and
//! previews; the `fail_*` switches simulate a store that rejects commits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{Entity, EntityStore, Row, SortOrder, StoreError, WriteBatch, WriteOp};
use crate::domain::EntityKind;

type Tables = HashMap<EntityKind, Vec<Row>>;

#[derive(Default)]
struct Inner {
    tables: Tables,
    fail_all: bool,
    /// Applies left before the one that fails
    fail_after: Option<usize>,
    fail_kind: Option<EntityKind>,
    commits: usize,
}

impl Inner {
    /// Decide whether this apply is rejected, consuming a one-shot failure
    fn rejects(&mut self, batch: &WriteBatch) -> Option<&'static str> {
        if self.fail_all {
            return Some("commits disabled");
        }
        if let Some(kind) = self.fail_kind {
            if batch.touches(kind) {
                return Some("kind rejected");
            }
        }
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                Some("injected failure")
            }
            Some(n) => {
                self.fail_after = Some(n - 1);
                None
            }
            None => None,
        }
    }
}

/// Memory-backed [`EntityStore`]
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("lock")
    }

    /// Reject every following commit until reset
    pub fn fail_commits(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    /// Reject only the `n`th commit from now (1 is the next one)
    pub fn fail_nth_commit(&self, n: usize) {
        self.lock().fail_after = n.checked_sub(1);
    }

    /// Reject every commit that writes `kind`, or stop doing so with `None`
    pub fn fail_commits_touching(&self, kind: Option<EntityKind>) {
        self.lock().fail_kind = kind;
    }

    /// Number of successful commits so far
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    /// Number of committed rows of `kind`
    pub fn committed_len(&self, kind: EntityKind) -> usize {
        self.lock().tables.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

fn apply_op(tables: &mut Tables, op: &WriteOp) -> Result<usize, StoreError> {
    match op {
        WriteOp::Insert(row) => {
            tables.entry(row.kind).or_default().push(row.clone());
            Ok(1)
        }
        WriteOp::Update(row) => {
            let existing = tables
                .get_mut(&row.kind)
                .and_then(|rows| rows.iter_mut().find(|r| r.id == row.id))
                .ok_or(StoreError::NotFound {
                    kind: row.kind,
                    id: row.id,
                })?;
            *existing = row.clone();
            Ok(1)
        }
        WriteOp::Delete { kind, id } => {
            let rows = tables.entry(*kind).or_default();
            let before = rows.len();
            rows.retain(|r| r.id != *id);
            if rows.len() == before {
                return Err(StoreError::NotFound { kind: *kind, id: *id });
            }
            Ok(1)
        }
        WriteOp::DeleteAll(kind) => Ok(tables.remove(kind).map(|rows| rows.len()).unwrap_or(0)),
    }
}

impl EntityStore for MemoryStore {
    fn fetch_all<E: Entity>(&self, order: SortOrder) -> Result<Vec<E>, StoreError> {
        let inner = self.lock();
        let mut rows: Vec<&Row> = inner
            .tables
            .get(&E::KIND)
            .map(|rows| rows.iter().collect())
            .unwrap_or_default();

        if order == SortOrder::DateAscending {
            // Stable sort keeps insertion order for ties
            rows.sort_by_key(|r| r.date_ms);
        }

        rows.into_iter()
            .map(|r| serde_json::from_str(&r.body).map_err(StoreError::from))
            .collect()
    }

    fn apply(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut inner = self.lock();
        let mut scratch = inner.tables.clone();
        let mut changed = 0;
        for op in batch.ops() {
            changed += apply_op(&mut scratch, op)?;
        }

        if let Some(reason) = inner.rejects(&batch) {
            tracing::warn!("Commit of {} writes rejected: {}", batch.len(), reason);
            return Err(StoreError::CommitRejected(reason.to_string()));
        }

        inner.tables = scratch;
        inner.commits += 1;
        Ok(changed)
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
