//! Change notifications
//!
//! The presentation layer registers listeners on a [`Notifier`]. Components
//! emit only after their commit has succeeded, so listeners never observe
//! state that could still be rolled back.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::challenges::ChallengeKind;

/// A level up event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
}

/// Events emitted after a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ProfileSaved,
    XpGranted { amount: u32, level: u32, current_xp: u32 },
    LevelUp(LevelUp),
    StreakExtended { count: u32 },
    QuestsChanged { count: usize },
    ChallengesRegenerated { date: DateTime<Utc> },
    ChallengeCompleted { id: Uuid, kind: ChallengeKind },
    /// The quest change was saved but re-evaluating challenges against it failed
    ChallengePassFailed { message: String },
    DataReset,
}

pub type Listener = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Fan-out of engine events to registered listeners
#[derive(Clone, Default)]
pub struct Notifier {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for all future events
    pub fn subscribe(&self, listener: impl Fn(&EngineEvent) + Send + Sync + 'static) {
        self.listeners.lock().expect("lock").push(Arc::new(listener));
    }

    pub fn emit(&self, event: EngineEvent) {
        // Clone out so listeners may subscribe re-entrantly
        let listeners: Vec<Listener> = self.listeners.lock().expect("lock").clone();
        for listener in listeners {
            listener(&event);
        }
    }
}
