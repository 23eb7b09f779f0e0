//! Progression ledger: XP, levels, streak and the user profile
//!
//! The ledger is the only writer of the [`User`] entity. Every operation
//! persists before returning. When the commit fails the in-memory profile
//! keeps the new values and the error is returned; treat it as provisional.

mod levels;

pub use levels::{LevelProgress, XP_PER_LEVEL, XpGrant, apply_xp, threshold};

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{AppTheme, EntityKind, User};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, Notifier};
use crate::store::{EntityStore, SortOrder, WriteBatch, save};

/// Owner of the singleton user profile
pub struct ProgressionLedger<S: EntityStore> {
    store: Arc<S>,
    notifier: Notifier,
    user: Mutex<Option<User>>,
}

impl<S: EntityStore> ProgressionLedger<S> {
    /// Create a ledger and load the stored profile, if any
    pub fn new(store: Arc<S>, notifier: Notifier) -> EngineResult<Self> {
        let user = Self::load_user(&store)?;
        Ok(Self {
            store,
            notifier,
            user: Mutex::new(user),
        })
    }

    fn load_user(store: &S) -> EngineResult<Option<User>> {
        let mut users: Vec<User> = store.fetch_all(SortOrder::Unsorted)?;
        if users.len() > 1 {
            let anomaly = EngineError::InvariantViolation(format!(
                "{} user profiles stored, using the first",
                users.len()
            ));
            tracing::warn!("{}", anomaly);
        }
        if users.is_empty() {
            tracing::debug!("No user profile stored yet");
            return Ok(None);
        }
        Ok(Some(users.swap_remove(0)))
    }

    fn lock(&self) -> MutexGuard<'_, Option<User>> {
        self.user.lock().expect("lock")
    }

    /// Re-read the profile from the store
    pub fn reload(&self) -> EngineResult<Option<User>> {
        let user = Self::load_user(&self.store)?;
        *self.lock() = user.clone();
        Ok(user)
    }

    /// Current profile (None before onboarding)
    pub fn user(&self) -> Option<User> {
        self.lock().clone()
    }

    pub fn progress(&self) -> Option<LevelProgress> {
        self.lock()
            .as_ref()
            .map(|u| LevelProgress::new(u.level, u.current_xp))
    }

    /// Create the profile, or rename an existing one
    pub fn onboard(&self, name: &str, avatar: &str) -> EngineResult<User> {
        let mut guard = self.lock();
        let mut batch = WriteBatch::new();
        let user = match guard.as_mut() {
            Some(existing) => {
                existing.name = name.to_string();
                existing.avatar = avatar.to_string();
                batch.update(&*existing)?;
                existing.clone()
            }
            None => {
                let user = User::new(name, avatar);
                batch.insert(&user)?;
                *guard = Some(user.clone());
                user
            }
        };
        self.store.apply(batch)?;
        drop(guard);

        tracing::info!("Saved profile for {}", user.name);
        self.notifier.emit(EngineEvent::ProfileSaved);
        Ok(user)
    }

    /// Add XP, levelling up at most once.
    ///
    /// A grant larger than the remaining distance to the next threshold still
    /// advances exactly one level; the surplus is kept as `current_xp`.
    pub fn grant_xp(&self, amount: u32) -> EngineResult<XpGrant> {
        let mut guard = self.lock();
        let user = Self::current(&mut guard)?;
        let (updated, grant) = Self::granted(user, amount)?;

        *user = updated;
        save(&*self.store, &*user)?;
        drop(guard);

        self.emit_grant(amount, &grant);
        Ok(grant)
    }

    /// Add XP and commit the profile together with the writes in `batch`.
    ///
    /// Unlike [`grant_xp`](Self::grant_xp) the in-memory profile only changes
    /// once the commit succeeds, so the caller can safely retry.
    pub(crate) fn grant_xp_with(&self, amount: u32, mut batch: WriteBatch) -> EngineResult<XpGrant> {
        let mut guard = self.lock();
        let user = Self::current(&mut guard)?;
        let (updated, grant) = Self::granted(user, amount)?;

        batch.update(&updated)?;
        self.store.apply(batch)?;
        *user = updated;
        drop(guard);

        self.emit_grant(amount, &grant);
        Ok(grant)
    }

    fn current<'a>(guard: &'a mut MutexGuard<'_, Option<User>>) -> EngineResult<&'a mut User> {
        guard.as_mut().ok_or(EngineError::NotFound {
            kind: EntityKind::User,
            id: None,
        })
    }

    /// Profile after granting `amount`
    fn granted(user: &User, amount: u32) -> EngineResult<(User, XpGrant)> {
        let grant = apply_xp(user.level, user.current_xp, amount).ok_or_else(|| {
            EngineError::InvariantViolation(format!(
                "granting {} XP to {} would overflow",
                amount, user.current_xp
            ))
        })?;

        if grant.current_xp >= threshold(grant.level) {
            tracing::warn!(
                "Grant of {} XP left {} XP at level {}, above the next threshold",
                amount,
                grant.current_xp,
                grant.level
            );
        }

        let mut updated = user.clone();
        updated.level = grant.level;
        updated.current_xp = grant.current_xp;
        Ok((updated, grant))
    }

    fn emit_grant(&self, amount: u32, grant: &XpGrant) {
        self.notifier.emit(EngineEvent::XpGranted {
            amount,
            level: grant.level,
            current_xp: grant.current_xp,
        });
        if let Some(level_up) = grant.level_up {
            tracing::info!("Level up: {} -> {}", level_up.old_level, level_up.new_level);
            self.notifier.emit(EngineEvent::LevelUp(level_up));
        }
    }

    /// Increment the streak by one. Callers decide when a tick is due.
    pub fn record_streak_tick(&self) -> EngineResult<u32> {
        let mut guard = self.lock();
        let user = Self::current(&mut guard)?;

        user.streak += 1;
        let count = user.streak;
        save(&*self.store, &*user)?;
        drop(guard);

        self.notifier.emit(EngineEvent::StreakExtended { count });
        Ok(count)
    }

    /// Add a theme to the unlocked set. Returns false if it was already unlocked.
    pub fn unlock_theme(&self, theme: AppTheme) -> EngineResult<bool> {
        let mut guard = self.lock();
        let user = Self::current(&mut guard)?;

        if !user.unlocked_themes.insert(theme) {
            return Ok(false);
        }
        save(&*self.store, &*user)?;
        drop(guard);

        self.notifier.emit(EngineEvent::ProfileSaved);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ledger() -> (Arc<MemoryStore>, ProgressionLedger<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = ProgressionLedger::new(store.clone(), Notifier::new()).unwrap();
        ledger.onboard("Ana", "fox").unwrap();
        (store, ledger)
    }

    #[test]
    fn test_onboard_twice_keeps_single_user() {
        let (store, ledger) = ledger();
        let first = ledger.user().unwrap();
        let renamed = ledger.onboard("Ana B", "owl").unwrap();

        assert_eq!(first.id, renamed.id);
        assert_eq!(renamed.avatar, "owl");
        assert_eq!(store.committed_len(EntityKind::User), 1);
    }

    #[test]
    fn test_grant_without_user() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ProgressionLedger::new(store, Notifier::new()).unwrap();
        assert!(ledger.grant_xp(10).unwrap_err().is_not_found());
        assert!(ledger.record_streak_tick().unwrap_err().is_not_found());
    }

    #[test]
    fn test_grant_persists_level_up() {
        let (store, ledger) = ledger();
        ledger.grant_xp(90).unwrap();
        let grant = ledger.grant_xp(500).unwrap();

        assert_eq!((grant.level, grant.current_xp), (2, 490));
        let stored: Vec<User> = store.fetch_all(SortOrder::Unsorted).unwrap();
        assert_eq!((stored[0].level, stored[0].current_xp), (2, 490));
    }

    #[test]
    fn test_zero_grant_still_commits() {
        let (store, ledger) = ledger();
        ledger.grant_xp(30).unwrap();
        let commits = store.commit_count();

        let grant = ledger.grant_xp(0).unwrap();
        assert_eq!((grant.level, grant.current_xp), (1, 30));
        assert_eq!(store.commit_count(), commits + 1);
    }

    #[test]
    fn test_failed_commit_leaves_memory_updated() {
        let (store, ledger) = ledger();
        store.fail_commits(true);

        let err = ledger.grant_xp(40).unwrap_err();
        assert!(matches!(err, EngineError::PersistenceFailure(_)));
        assert_eq!(ledger.user().unwrap().current_xp, 40);

        // The durable copy never saw the grant
        let reloaded = ledger.reload().unwrap().unwrap();
        assert_eq!(reloaded.current_xp, 0);
    }

    #[test]
    fn test_streak_ticks_unconditionally() {
        let (_, ledger) = ledger();
        assert_eq!(ledger.record_streak_tick().unwrap(), 1);
        assert_eq!(ledger.record_streak_tick().unwrap(), 2);
        assert_eq!(ledger.user().unwrap().streak, 2);
    }

    #[test]
    fn test_duplicate_users_first_wins() {
        let store = Arc::new(MemoryStore::new());
        let mut batch = WriteBatch::new();
        batch.insert(&User::new("First", "fox")).unwrap();
        batch.insert(&User::new("Second", "owl")).unwrap();
        store.apply(batch).unwrap();

        let ledger = ProgressionLedger::new(store, Notifier::new()).unwrap();
        assert_eq!(ledger.user().unwrap().name, "First");
    }

    #[test]
    fn test_overflow_is_invariant_violation() {
        let (_, ledger) = ledger();
        ledger.grant_xp(50).unwrap();
        let err = ledger.grant_xp(u32::MAX).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
        assert_eq!(ledger.user().unwrap().current_xp, 50);
    }

    #[test]
    fn test_unlock_theme_once() {
        let (_, ledger) = ledger();
        assert!(ledger.unlock_theme(AppTheme::Colorful).unwrap());
        assert!(!ledger.unlock_theme(AppTheme::Colorful).unwrap());
        assert!(ledger.user().unwrap().unlocked_themes.contains(&AppTheme::Colorful));
    }

    #[test]
    fn test_grant_with_batch_commits_both_or_neither() {
        let (store, ledger) = ledger();
        let quest = crate::domain::Quest {
            id: uuid::Uuid::new_v4(),
            title: "Walk".to_string(),
            description: None,
            xp_value: 40,
            category: None,
            date: chrono::Utc::now(),
            deadline: None,
            is_completed: true,
            xp_claimed: false,
        };
        let mut seed = WriteBatch::new();
        seed.insert(&quest).unwrap();
        store.apply(seed).unwrap();

        let claimed = crate::domain::Quest {
            xp_claimed: true,
            ..quest.clone()
        };
        let mut batch = WriteBatch::new();
        batch.update(&claimed).unwrap();

        store.fail_nth_commit(1);
        assert!(ledger.grant_xp_with(40, batch.clone()).is_err());
        // Nothing moved, in memory or on disk
        assert_eq!(ledger.user().unwrap().current_xp, 0);
        let stored: Vec<crate::domain::Quest> = store.fetch_all(SortOrder::Unsorted).unwrap();
        assert!(!stored[0].xp_claimed);

        let grant = ledger.grant_xp_with(40, batch).unwrap();
        assert_eq!(grant.current_xp, 40);
        let stored: Vec<crate::domain::Quest> = store.fetch_all(SortOrder::Unsorted).unwrap();
        assert!(stored[0].xp_claimed);
        assert_eq!(ledger.reload().unwrap().unwrap().current_xp, 40);
    }

    #[test]
    fn test_concurrent_grants_are_serialized() {
        let (store, ledger) = ledger();
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        ledger.grant_xp(1).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored: Vec<User> = store.fetch_all(SortOrder::Unsorted).unwrap();
        assert_eq!(stored[0].current_xp, 40);
        assert_eq!(ledger.user().unwrap(), stored[0]);
    }
}
