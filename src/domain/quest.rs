use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a quest
pub type QuestId = Uuid;

/// A self-assigned task that pays out XP when completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// XP granted on completion
    pub xp_value: u32,

    #[serde(default)]
    pub category: Option<String>,

    /// Scheduled timestamp used by every time-based challenge check.
    /// Equals `deadline` when one was given, otherwise the creation time.
    pub date: DateTime<Utc>,

    /// Deadline supplied at creation, if any
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    /// One-way flag: never goes back to false
    pub is_completed: bool,

    /// Set in the same commit that grants the quest's XP
    #[serde(default)]
    pub xp_claimed: bool,
}

