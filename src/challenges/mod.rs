//! Daily challenge engine
//!
//! Keeps exactly one batch of ten challenges, all sharing one generation
//! date. Every refresh first replaces a batch from a previous day, then
//! checks each pending challenge against the caller's quest snapshot.

mod catalog;
mod predicates;

pub use catalog::{ChallengeKind, Requirement};
pub use predicates::evaluate;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::day::is_same_day;
use crate::domain::{Challenge, EntityKind, Quest};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, Notifier};
use crate::store::{EntityStore, SortOrder, WriteBatch, save};

/// Owner of the challenge batch
pub struct ChallengeEngine<S: EntityStore> {
    store: Arc<S>,
    notifier: Notifier,
    batch: Mutex<Vec<Challenge>>,
}

impl<S: EntityStore> ChallengeEngine<S> {
    /// Create an engine and load the stored batch
    pub fn new(store: Arc<S>, notifier: Notifier) -> EngineResult<Self> {
        let batch = Self::load_batch(&store)?;
        Ok(Self {
            store,
            notifier,
            batch: Mutex::new(batch),
        })
    }

    fn load_batch(store: &S) -> EngineResult<Vec<Challenge>> {
        let mut batch: Vec<Challenge> = store.fetch_all(SortOrder::Unsorted)?;
        batch.sort_by_key(|c| c.kind.number());
        tracing::debug!("Loaded {} challenges", batch.len());
        Ok(batch)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Challenge>> {
        self.batch.lock().expect("lock")
    }

    /// Re-read the batch from the store
    pub fn reload(&self) -> EngineResult<Vec<Challenge>> {
        let batch = Self::load_batch(&self.store)?;
        *self.lock() = batch.clone();
        Ok(batch)
    }

    /// Current batch in catalog order, without refreshing
    pub fn challenges(&self) -> Vec<Challenge> {
        self.lock().clone()
    }

    /// Regenerate the batch if needed and evaluate pending challenges
    pub fn refresh(&self, quests: &[Quest]) -> EngineResult<Vec<Challenge>> {
        self.refresh_at(quests, Utc::now())
    }

    /// [`refresh`](Self::refresh) as of `now`
    pub fn refresh_at(&self, quests: &[Quest], now: DateTime<Utc>) -> EngineResult<Vec<Challenge>> {
        let mut batch = self.lock();
        let mut events = Vec::new();

        if is_stale(&batch, &now) {
            *batch = self.regenerate(now)?;
            events.push(EngineEvent::ChallengesRegenerated { date: now });
        }

        let evaluated = self.complete_satisfied(&mut batch, quests, &now);
        let snapshot = batch.clone();
        drop(batch);

        // A committed regeneration is announced even if evaluation failed
        for event in events {
            self.notifier.emit(event);
        }
        for challenge in evaluated? {
            self.notifier.emit(EngineEvent::ChallengeCompleted {
                id: challenge.id,
                kind: challenge.kind,
            });
        }
        Ok(snapshot)
    }

    /// Commit every pending challenge whose requirement now holds.
    ///
    /// `batch` only changes after the commit succeeds.
    fn complete_satisfied(
        &self,
        batch: &mut [Challenge],
        quests: &[Quest],
        now: &DateTime<Utc>,
    ) -> EngineResult<Vec<Challenge>> {
        let completed: Vec<Challenge> = batch
            .iter()
            .filter(|c| !c.is_completed && evaluate(c.kind.requirement(), quests, now) == Some(true))
            .map(|c| Challenge {
                is_completed: true,
                ..c.clone()
            })
            .collect();
        if completed.is_empty() {
            return Ok(completed);
        }

        let mut writes = WriteBatch::new();
        for challenge in &completed {
            writes.update(challenge)?;
        }
        if let Err(e) = self.store.apply(writes) {
            tracing::warn!("Challenge completions not saved: {}", e);
            return Err(e.into());
        }

        for challenge in &completed {
            if let Some(slot) = batch.iter_mut().find(|c| c.id == challenge.id) {
                slot.is_completed = true;
            }
            tracing::info!("Challenge completed: {}", challenge.description());
        }
        Ok(completed)
    }

    /// Replace every stored challenge with a new batch dated `now`.
    ///
    /// Runs as one commit. On failure the previous batch stays in place.
    fn regenerate(&self, now: DateTime<Utc>) -> EngineResult<Vec<Challenge>> {
        let fresh: Vec<Challenge> = ChallengeKind::all()
            .iter()
            .map(|kind| Challenge::new(*kind, now))
            .collect();

        let mut writes = WriteBatch::new();
        writes.delete_all(EntityKind::Challenge);
        for challenge in &fresh {
            writes.insert(challenge)?;
        }
        let changed = self.store.apply(writes)?;

        tracing::info!(
            "Generated {} daily challenges (replaced {})",
            fresh.len(),
            changed.saturating_sub(fresh.len())
        );
        Ok(fresh)
    }

    /// Mark a challenge completed by hand
    pub fn complete(&self, id: Uuid) -> EngineResult<()> {
        let mut batch = self.lock();
        let challenge = batch
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Challenge, id))?;

        if challenge.is_completed {
            return Ok(());
        }

        let completed = Challenge {
            is_completed: true,
            ..challenge.clone()
        };
        save(&*self.store, &completed)?;
        *challenge = completed;
        let kind = challenge.kind;
        drop(batch);

        tracing::info!("Challenge completed manually: {}", kind.description());
        self.notifier.emit(EngineEvent::ChallengeCompleted { id, kind });
        Ok(())
    }
}

/// Whether the batch must be replaced before evaluation
fn is_stale(batch: &[Challenge], now: &DateTime<Utc>) -> bool {
    let Some(first) = batch.first() else {
        return true;
    };

    if batch.len() != ChallengeKind::all().len() || batch.iter().any(|c| c.date != first.date) {
        let anomaly = EngineError::InvariantViolation(format!(
            "challenge table holds {} rows across several batches, regenerating",
            batch.len()
        ));
        tracing::warn!("{}", anomaly);
        return true;
    }

    !is_same_day(&first.date, now)
}
