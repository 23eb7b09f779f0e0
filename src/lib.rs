//! Questlog - a gamified quest log
//!
//! Quests are to-do items worth XP. Completing them levels up a single user
//! profile and drives a batch of ten daily challenges that is regenerated on
//! the first use of each calendar day.
//!
//! ## Components
//!
//! Each component is the only writer of one entity kind:
//!
//! 1. [`ProgressionLedger`](progression::ProgressionLedger): the [`User`]
//!    profile, XP, level and streak.
//! 2. [`QuestRegistry`](quests::QuestRegistry): the [`Quest`] list.
//! 3. [`ChallengeEngine`](challenges::ChallengeEngine): the [`Challenge`] batch.
//!
//! [`QuestLog`] wires them to one [`EntityStore`](store::EntityStore). Each
//! mutation is one atomic write batch. The only batch spanning two kinds is
//! a quest completion's XP grant, which commits the user together with the
//! quest's claimed flag.

pub mod app;
pub mod challenges;
pub mod config;
pub mod day;
pub mod domain;
pub mod error;
pub mod events;
pub mod progression;
pub mod quests;
pub mod store;

pub use app::{QuestCompletion, QuestLog};
pub use domain::*;
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, Notifier};
