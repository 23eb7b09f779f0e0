//! Core domain types for Questlog
//!
//! Three entity kinds are persisted: the singleton [`User`], the user's
//! [`Quest`]s and the current daily [`Challenge`] batch.

mod challenge;
mod quest;
mod theme;
mod user;

pub use challenge::Challenge;
pub use quest::{Quest, QuestId};
pub use theme::AppTheme;
pub use user::User;

use serde::{Deserialize, Serialize};

/// The kinds of entity held by an [`EntityStore`](crate::store::EntityStore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Quest,
    Challenge,
}

impl EntityKind {
    /// All kinds, in reset order
    pub fn all() -> &'static [EntityKind] {
        &[Self::User, Self::Quest, Self::Challenge]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Quest => "quest",
            Self::Challenge => "challenge",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
