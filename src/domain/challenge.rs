use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::challenges::ChallengeKind;

/// One member of the daily challenge batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,

    /// Catalog entry this challenge was generated from
    pub kind: ChallengeKind,

    pub reward_xp: u32,

    /// Generation timestamp, shared by every member of the batch
    pub date: DateTime<Utc>,

    pub is_completed: bool,
}

impl Challenge {
    /// New pending challenge for a batch generated at `date`
    pub fn new(kind: ChallengeKind, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            reward_xp: kind.reward_xp(),
            date,
            is_completed: false,
        }
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}
