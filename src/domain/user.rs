use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppTheme;

/// The player profile. Exactly one exists once onboarding has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Display name chosen during onboarding
    pub name: String,

    /// Avatar asset reference
    pub avatar: String,

    /// XP accumulated toward the next level, always below `level * 100`
    pub current_xp: u32,

    /// Current level, starting at 1
    pub level: u32,

    /// Consecutive-day completion counter
    pub streak: u32,

    #[serde(default)]
    pub unlocked_themes: BTreeSet<AppTheme>,
}

impl User {
    /// Fresh level-1 profile
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar: avatar.into(),
            current_xp: 0,
            level: 1,
            streak: 0,
            unlocked_themes: BTreeSet::new(),
        }
    }
}
