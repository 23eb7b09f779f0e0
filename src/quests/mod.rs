//! Quest registry
//!
//! Owns the quest collection. Every mutation persists, re-reads the full
//! date-sorted list, then hands that list to the challenge engine for a
//! re-evaluation pass. The pass runs after the quest change is committed and
//! its failure never undoes or fails that change.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::challenges::ChallengeEngine;
use crate::domain::{EntityKind, Quest, QuestId};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, Notifier};
use crate::store::{EntityStore, SortOrder, WriteBatch};

/// Input for [`QuestRegistry::create`]
#[derive(Debug, Clone, Default)]
pub struct NewQuest {
    pub title: String,
    pub description: Option<String>,
    pub xp_value: u32,
    pub category: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

impl NewQuest {
    pub fn new(title: impl Into<String>, xp_value: u32) -> Self {
        Self {
            title: title.into(),
            xp_value,
            ..Default::default()
        }
    }
}

/// Owner of the quest list
pub struct QuestRegistry<S: EntityStore> {
    store: Arc<S>,
    notifier: Notifier,
    challenges: Arc<ChallengeEngine<S>>,
    quests: Mutex<Vec<Quest>>,
}

impl<S: EntityStore> QuestRegistry<S> {
    /// Create a registry and load the stored quests
    pub fn new(
        store: Arc<S>,
        challenges: Arc<ChallengeEngine<S>>,
        notifier: Notifier,
    ) -> EngineResult<Self> {
        let quests = store.fetch_all(SortOrder::DateAscending)?;
        Ok(Self {
            store,
            notifier,
            challenges,
            quests: Mutex::new(quests),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Quest>> {
        self.quests.lock().expect("lock")
    }

    /// Quests sorted ascending by date
    pub fn quests(&self) -> Vec<Quest> {
        self.lock().clone()
    }

    pub fn get(&self, id: QuestId) -> Option<Quest> {
        self.lock().iter().find(|q| q.id == id).cloned()
    }

    /// Re-read the list from the store
    pub fn reload(&self) -> EngineResult<Vec<Quest>> {
        let quests: Vec<Quest> = self.store.fetch_all(SortOrder::DateAscending)?;
        *self.lock() = quests.clone();
        Ok(quests)
    }

    pub fn create(&self, new: NewQuest) -> EngineResult<Vec<Quest>> {
        self.create_at(new, Utc::now())
    }

    /// Add a quest dated at its deadline, or at `now` when it has none
    pub fn create_at(&self, new: NewQuest, now: DateTime<Utc>) -> EngineResult<Vec<Quest>> {
        if new.xp_value == 0 {
            return Err(EngineError::InvariantViolation(
                "quest XP value must be positive".to_string(),
            ));
        }

        let quest = Quest {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            xp_value: new.xp_value,
            category: new.category,
            date: new.deadline.unwrap_or(now),
            deadline: new.deadline,
            is_completed: false,
            xp_claimed: false,
        };

        let mut batch = WriteBatch::new();
        batch.insert(&quest)?;

        let mut quests = self.lock();
        quests.push(quest);
        quests.sort_by_key(|q| q.date);
        self.commit_and_refresh(quests, batch, now)
    }

    pub fn complete(&self, id: QuestId) -> EngineResult<Vec<Quest>> {
        self.complete_at(id, Utc::now())
    }

    /// Mark a quest completed. Completing a completed quest changes nothing.
    pub fn complete_at(&self, id: QuestId, now: DateTime<Utc>) -> EngineResult<Vec<Quest>> {
        let mut quests = self.lock();
        let quest = quests
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Quest, id))?;

        if quest.is_completed {
            return Ok(quests.clone());
        }

        quest.is_completed = true;
        let mut batch = WriteBatch::new();
        batch.update(&*quest)?;
        self.commit_and_refresh(quests, batch, now)
    }

    pub fn delete(&self, id: QuestId) -> EngineResult<Vec<Quest>> {
        self.delete_at(id, Utc::now())
    }

    /// Permanently remove a quest. Deleting never touches XP.
    pub fn delete_at(&self, id: QuestId, now: DateTime<Utc>) -> EngineResult<Vec<Quest>> {
        let mut quests = self.lock();
        let index = quests
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Quest, id))?;

        quests.remove(index);
        let mut batch = WriteBatch::new();
        batch.delete::<Quest>(id);
        self.commit_and_refresh(quests, batch, now)
    }

    /// Stage the write that marks a completed quest's XP as paid out.
    ///
    /// Returns None when the XP was already claimed. The write must be
    /// committed together with the grant, then recorded with
    /// [`record_claim`](Self::record_claim).
    pub(crate) fn claim(&self, id: QuestId) -> EngineResult<Option<(u32, WriteBatch)>> {
        let quests = self.lock();
        let quest = quests
            .iter()
            .find(|q| q.id == id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Quest, id))?;

        if quest.xp_claimed || !quest.is_completed {
            return Ok(None);
        }

        let claimed = Quest {
            xp_claimed: true,
            ..quest.clone()
        };
        let mut batch = WriteBatch::new();
        batch.update(&claimed)?;
        Ok(Some((quest.xp_value, batch)))
    }

    /// Mirror a committed claim in memory
    pub(crate) fn record_claim(&self, id: QuestId) {
        if let Some(quest) = self.lock().iter_mut().find(|q| q.id == id) {
            quest.xp_claimed = true;
        }
    }

    /// Commit, re-read the sorted list and run a challenge pass over it
    fn commit_and_refresh(
        &self,
        mut quests: MutexGuard<'_, Vec<Quest>>,
        batch: WriteBatch,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Quest>> {
        if let Err(e) = self.store.apply(batch) {
            tracing::warn!("Quest change not saved: {}", e);
            return Err(e.into());
        }

        *quests = self.store.fetch_all(SortOrder::DateAscending)?;
        let snapshot = quests.clone();
        drop(quests);

        self.notifier.emit(EngineEvent::QuestsChanged {
            count: snapshot.len(),
        });
        if let Err(e) = self.challenges.refresh_at(&snapshot, now) {
            tracing::warn!("Challenge pass after quest change failed: {}", e);
            self.notifier.emit(EngineEvent::ChallengePassFailed {
                message: e.to_string(),
            });
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, Local, TimeZone};

    fn registry() -> (Arc<MemoryStore>, QuestRegistry<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::new();
        let engine = Arc::new(ChallengeEngine::new(store.clone(), notifier.clone()).unwrap());
        let registry = QuestRegistry::new(store.clone(), engine, notifier).unwrap();
        (store, registry)
    }

    fn noon() -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2025, 5, 23, 12, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_create_sorts_by_date() {
        let (store, registry) = registry();
        let now = noon();

        let mut later = NewQuest::new("Later", 20);
        later.deadline = Some(now + Duration::hours(3));
        registry.create_at(later, now).unwrap();
        let list = registry.create_at(NewQuest::new("Now", 10), now).unwrap();

        let titles: Vec<_> = list.iter().map(|q| q.title.as_str()).collect();
        assert_eq!(titles, ["Now", "Later"]);
        assert_eq!(list[1].deadline, Some(now + Duration::hours(3)));
        assert_eq!(list[0].date, now);
        assert!(list[0].deadline.is_none());
        assert_eq!(store.committed_len(EntityKind::Quest), 2);
    }

    #[test]
    fn test_zero_xp_rejected() {
        let (_, registry) = registry();
        let err = registry.create_at(NewQuest::new("Free", 0), noon()).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
        assert!(registry.quests().is_empty());
    }

    #[test]
    fn test_complete_is_one_way_and_idempotent() {
        let (_, registry) = registry();
        let list = registry.create_at(NewQuest::new("Run", 30), noon()).unwrap();
        let id = list[0].id;

        let list = registry.complete_at(id, noon()).unwrap();
        assert!(list[0].is_completed);
        let list = registry.complete_at(id, noon()).unwrap();
        assert!(list[0].is_completed);
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let (store, registry) = registry();
        let list = registry.create_at(NewQuest::new("Read", 15), noon()).unwrap();
        let id = list[0].id;

        assert!(registry.delete_at(id, noon()).unwrap().is_empty());
        let err = registry.delete_at(id, noon()).unwrap_err();
        assert!(err.is_not_found());
        assert!(!matches!(err, EngineError::PersistenceFailure(_)));
        assert_eq!(store.committed_len(EntityKind::Quest), 0);
    }

    #[test]
    fn test_complete_unknown_quest() {
        let (_, registry) = registry();
        assert!(registry.complete_at(Uuid::new_v4(), noon()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_failed_commit_keeps_attempted_mutation_in_memory() {
        let (store, registry) = registry();
        store.fail_commits(true);

        let err = registry.create_at(NewQuest::new("Swim", 25), noon()).unwrap_err();
        assert!(matches!(err, EngineError::PersistenceFailure(_)));
        assert_eq!(registry.quests().len(), 1);
        assert_eq!(store.committed_len(EntityKind::Quest), 0);

        store.fail_commits(false);
        assert!(registry.reload().unwrap().is_empty());
    }

    #[test]
    fn test_mutations_drive_challenge_evaluation() {
        let (store, registry) = registry();
        let now = noon();
        for title in ["a", "b", "c"] {
            let list = registry.create_at(NewQuest::new(title, 10), now).unwrap();
            let id = list.iter().find(|q| q.title == title).unwrap().id;
            registry.complete_at(id, now).unwrap();
        }

        let challenges: Vec<crate::domain::Challenge> =
            store.fetch_all(SortOrder::Unsorted).unwrap();
        assert_eq!(challenges.len(), 10);
        let three_today = challenges
            .iter()
            .find(|c| c.kind == crate::challenges::ChallengeKind::ThreeQuestsToday)
            .unwrap();
        assert!(three_today.is_completed);
    }

    #[test]
    fn test_challenge_failure_does_not_fail_quest_change() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::new();
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = events.clone();
        notifier.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        let engine = Arc::new(ChallengeEngine::new(store.clone(), notifier.clone()).unwrap());
        let registry = QuestRegistry::new(store.clone(), engine, notifier).unwrap();

        store.fail_commits_touching(Some(EntityKind::Challenge));
        let list = registry.create_at(NewQuest::new("Yoga", 30), noon()).unwrap();
        let list = registry.complete_at(list[0].id, noon()).unwrap();
        assert!(list[0].is_completed);

        let stored: Vec<Quest> = store.fetch_all(SortOrder::Unsorted).unwrap();
        assert!(stored[0].is_completed);
        assert_eq!(store.committed_len(EntityKind::Challenge), 0);

        let events = events.lock().unwrap();
        assert!(events.contains(&EngineEvent::QuestsChanged { count: 1 }));
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::ChallengePassFailed { .. })));
    }

    #[test]
    fn test_claim_only_once_and_only_when_completed() {
        let (store, registry) = registry();
        let list = registry.create_at(NewQuest::new("Cook", 35), noon()).unwrap();
        let id = list[0].id;
        assert!(registry.claim(id).unwrap().is_none());

        registry.complete_at(id, noon()).unwrap();
        let (xp, batch) = registry.claim(id).unwrap().unwrap();
        assert_eq!(xp, 35);
        store.apply(batch).unwrap();
        registry.record_claim(id);

        assert!(registry.claim(id).unwrap().is_none());
        assert!(registry.reload().unwrap()[0].xp_claimed);
        assert!(registry.claim(Uuid::new_v4()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_concurrent_creates_all_commit() {
        let (store, registry) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for j in 0..5 {
                        registry
                            .create_at(NewQuest::new(format!("{i}-{j}"), 10), noon())
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.committed_len(EntityKind::Quest), 30);
        assert_eq!(registry.quests().len(), 30);
    }
}
