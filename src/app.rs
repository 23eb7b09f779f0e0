//! Engine facade
//!
//! [`QuestLog`] opens the store once and wires the three components to it.
//! Each component owns one entity kind; the facade only adds the flows that
//! span several of them.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::challenges::ChallengeEngine;
use crate::domain::{Challenge, EntityKind, Quest, QuestId};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, Notifier};
use crate::progression::{ProgressionLedger, XpGrant};
use crate::quests::QuestRegistry;
use crate::store::{EntityStore, SqliteStore, WriteBatch};

/// Result of completing a quest through the facade
#[derive(Debug, Clone)]
pub struct QuestCompletion {
    pub quests: Vec<Quest>,
    /// None when the quest's XP was already granted
    pub grant: Option<XpGrant>,
}

/// Central handle on the quest engine
pub struct QuestLog<S: EntityStore> {
    store: Arc<S>,
    notifier: Notifier,
    ledger: ProgressionLedger<S>,
    quests: QuestRegistry<S>,
    challenges: Arc<ChallengeEngine<S>>,
    /// Serializes quest completions so a claim is granted once
    completing: Mutex<()>,
}

impl QuestLog<SqliteStore> {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> EngineResult<Self> {
        let store = SqliteStore::open(path)?;
        Self::with_store(Arc::new(store))
    }
}

impl<S: EntityStore> QuestLog<S> {
    /// Wire the components to an existing store
    pub fn with_store(store: Arc<S>) -> EngineResult<Self> {
        let notifier = Notifier::new();
        let ledger = ProgressionLedger::new(store.clone(), notifier.clone())?;
        let challenges = Arc::new(ChallengeEngine::new(store.clone(), notifier.clone())?);
        let quests = QuestRegistry::new(store.clone(), challenges.clone(), notifier.clone())?;

        Ok(Self {
            store,
            notifier,
            ledger,
            quests,
            challenges,
            completing: Mutex::new(()),
        })
    }

    pub fn ledger(&self) -> &ProgressionLedger<S> {
        &self.ledger
    }

    pub fn quests(&self) -> &QuestRegistry<S> {
        &self.quests
    }

    pub fn challenges(&self) -> &ChallengeEngine<S> {
        &self.challenges
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn subscribe(&self, listener: impl Fn(&EngineEvent) + Send + Sync + 'static) {
        self.notifier.subscribe(listener);
    }

    /// Regenerate and evaluate the daily challenges against the current quests
    pub fn refresh_challenges(&self) -> EngineResult<Vec<Challenge>> {
        self.refresh_challenges_at(Utc::now())
    }

    pub fn refresh_challenges_at(&self, now: DateTime<Utc>) -> EngineResult<Vec<Challenge>> {
        self.challenges.refresh_at(&self.quests.quests(), now)
    }

    pub fn complete_quest(&self, id: QuestId) -> EngineResult<QuestCompletion> {
        self.complete_quest_at(id, Utc::now())
    }

    /// Complete a quest and award its XP.
    ///
    /// The XP and the quest's claimed flag are committed together, so a
    /// retry after any failure grants the XP exactly once.
    pub fn complete_quest_at(&self, id: QuestId, now: DateTime<Utc>) -> EngineResult<QuestCompletion> {
        let _completing = self.completing.lock().expect("lock");
        let quest = self
            .quests
            .get(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Quest, id))?;

        if !quest.is_completed {
            self.quests.complete_at(id, now)?;
        }

        let Some((xp, claim)) = self.quests.claim(id)? else {
            return Ok(QuestCompletion {
                quests: self.quests.quests(),
                grant: None,
            });
        };

        let grant = self.ledger.grant_xp_with(xp, claim)?;
        self.quests.record_claim(id);
        Ok(QuestCompletion {
            quests: self.quests.quests(),
            grant: Some(grant),
        })
    }

    /// Mark a challenge completed by hand
    pub fn complete_challenge(&self, id: Uuid) -> EngineResult<()> {
        self.challenges.complete(id)
    }

    /// Delete every entity of every kind and reload the components
    pub fn reset_all(&self) -> EngineResult<()> {
        let mut batch = WriteBatch::new();
        for kind in EntityKind::all() {
            batch.delete_all(*kind);
        }
        let removed = self.store.apply(batch)?;

        self.ledger.reload()?;
        self.quests.reload()?;
        self.challenges.reload()?;

        tracing::info!("Reset all data ({} entities removed)", removed);
        self.notifier.emit(EngineEvent::DataReset);
        Ok(())
    }

    /// Push committed state to disk. Call on process suspension.
    pub fn flush(&self) -> EngineResult<()> {
        self.store.flush()?;
        Ok(())
    }
}
