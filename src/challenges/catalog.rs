//! Daily challenge catalog
//!
//! Ten fixed challenges make up every daily batch. The catalog is closed:
//! each kind carries its description, XP reward and completion requirement.

use serde::{Deserialize, Serialize};

/// Unique identifier for each catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    ThreeQuestsToday,
    MorningQuests,
    ThreeDayStreak,
    FiveQuestsInOneDay,
    ThreeCategories,
    HighPriorityQuest,
    AllBeforeNoon,
    FiftyXpQuest,
    TwoInARow,
    QuestWithDeadline,
}

/// What has to be true of the quest snapshot for a challenge to complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// At least N quests dated today are completed
    CompletedToday(usize),
    /// Morning quests (local hour < 12) exist and are all completed
    MorningQuestsDone,
    /// N-day streak. Not derivable from quest data, so never auto-completes.
    DailyStreak(u32),
    /// Completed quests dated today span at least N distinct categories
    DistinctCategoriesToday(usize),
    /// Some completed quest is worth at least N XP
    CompletedWithXp(u32),
    /// The two latest completed quests (by date) fall on the same day
    LastTwoSameDay,
    /// Some completed quest was created with a deadline
    CompletedWithDeadline,
}

impl ChallengeKind {
    /// Catalog order, which is also evaluation order
    pub fn all() -> &'static [ChallengeKind] {
        &[
            Self::ThreeQuestsToday,
            Self::MorningQuests,
            Self::ThreeDayStreak,
            Self::FiveQuestsInOneDay,
            Self::ThreeCategories,
            Self::HighPriorityQuest,
            Self::AllBeforeNoon,
            Self::FiftyXpQuest,
            Self::TwoInARow,
            Self::QuestWithDeadline,
        ]
    }

    /// Position in the catalog (1-10)
    pub fn number(&self) -> u32 {
        match self {
            Self::ThreeQuestsToday => 1,
            Self::MorningQuests => 2,
            Self::ThreeDayStreak => 3,
            Self::FiveQuestsInOneDay => 4,
            Self::ThreeCategories => 5,
            Self::HighPriorityQuest => 6,
            Self::AllBeforeNoon => 7,
            Self::FiftyXpQuest => 8,
            Self::TwoInARow => 9,
            Self::QuestWithDeadline => 10,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ThreeQuestsToday => "Complete 3 quests today",
            Self::MorningQuests => "Finish all morning quests",
            Self::ThreeDayStreak => "Maintain a 3-day streak",
            Self::FiveQuestsInOneDay => "Complete 5 quests in one day",
            Self::ThreeCategories => "Complete quests from 3 different categories",
            Self::HighPriorityQuest => "Complete a high-priority quest",
            Self::AllBeforeNoon => "Complete all quests before noon",
            Self::FiftyXpQuest => "Complete a quest with 50+ XP reward",
            Self::TwoInARow => "Complete 2 quests in a row",
            Self::QuestWithDeadline => "Complete a quest with a deadline",
        }
    }

    pub fn reward_xp(&self) -> u32 {
        match self {
            Self::ThreeQuestsToday => 50,
            Self::MorningQuests => 75,
            Self::ThreeDayStreak => 100,
            Self::FiveQuestsInOneDay => 150,
            Self::ThreeCategories => 125,
            Self::HighPriorityQuest => 80,
            Self::AllBeforeNoon => 200,
            Self::FiftyXpQuest => 100,
            Self::TwoInARow => 60,
            Self::QuestWithDeadline => 90,
        }
    }

    // #2/#7 and #6/#8 share a condition at different reward tiers.
    pub fn requirement(&self) -> Requirement {
        match self {
            Self::ThreeQuestsToday => Requirement::CompletedToday(3),
            Self::MorningQuests => Requirement::MorningQuestsDone,
            Self::ThreeDayStreak => Requirement::DailyStreak(3),
            Self::FiveQuestsInOneDay => Requirement::CompletedToday(5),
            Self::ThreeCategories => Requirement::DistinctCategoriesToday(3),
            Self::HighPriorityQuest => Requirement::CompletedWithXp(50),
            Self::AllBeforeNoon => Requirement::MorningQuestsDone,
            Self::FiftyXpQuest => Requirement::CompletedWithXp(50),
            Self::TwoInARow => Requirement::LastTwoSameDay,
            Self::QuestWithDeadline => Requirement::CompletedWithDeadline,
        }
    }

    /// Get the string ID used in logs and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeQuestsToday => "three_quests_today",
            Self::MorningQuests => "morning_quests",
            Self::ThreeDayStreak => "three_day_streak",
            Self::FiveQuestsInOneDay => "five_quests_in_one_day",
            Self::ThreeCategories => "three_categories",
            Self::HighPriorityQuest => "high_priority_quest",
            Self::AllBeforeNoon => "all_before_noon",
            Self::FiftyXpQuest => "fifty_xp_quest",
            Self::TwoInARow => "two_in_a_row",
            Self::QuestWithDeadline => "quest_with_deadline",
        }
    }

    /// Total XP on offer in one batch
    pub fn total_xp() -> u32 {
        Self::all().iter().map(|k| k.reward_xp()).sum()
    }
}

impl std::fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
