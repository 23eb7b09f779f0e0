//! Challenge condition checks
//!
//! Pure functions over a quest snapshot. Only requirements that say "today"
//! filter by date; the rest look at the whole snapshot the caller passed in.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone};

use super::catalog::Requirement;
use crate::day::{is_same_day, is_today, local_hour};
use crate::domain::Quest;

/// Evaluate a requirement against `quests` as of `now`.
///
/// Returns `None` when the requirement cannot be decided from quest data.
pub fn evaluate<Tz: TimeZone>(
    requirement: Requirement,
    quests: &[Quest],
    now: &DateTime<Tz>,
) -> Option<bool> {
    let met = match requirement {
        Requirement::CompletedToday(n) => completed_today(quests, now).count() >= n,
        Requirement::MorningQuestsDone => morning_quests_done(quests),
        Requirement::DailyStreak(_) => return None,
        Requirement::DistinctCategoriesToday(n) => distinct_categories_today(quests, now) >= n,
        Requirement::CompletedWithXp(xp) => quests.iter().any(|q| q.is_completed && q.xp_value >= xp),
        Requirement::LastTwoSameDay => last_two_same_day(quests),
        Requirement::CompletedWithDeadline => {
            quests.iter().any(|q| q.is_completed && q.deadline.is_some())
        }
    };
    Some(met)
}

fn completed_today<'a, Tz: TimeZone + 'a>(
    quests: &'a [Quest],
    now: &'a DateTime<Tz>,
) -> impl Iterator<Item = &'a Quest> + 'a {
    quests
        .iter()
        .filter(move |q| q.is_completed && is_today(&q.date, now))
}

fn morning_quests_done(quests: &[Quest]) -> bool {
    let mut morning = quests.iter().filter(|q| local_hour(&q.date) < 12).peekable();
    morning.peek().is_some() && morning.all(|q| q.is_completed)
}

fn distinct_categories_today<Tz: TimeZone>(quests: &[Quest], now: &DateTime<Tz>) -> usize {
    completed_today(quests, now)
        .filter_map(|q| q.category.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

fn last_two_same_day(quests: &[Quest]) -> bool {
    let mut completed: Vec<&Quest> = quests.iter().filter(|q| q.is_completed).collect();
    if completed.len() < 2 {
        return false;
    }
    completed.sort_by_key(|q| q.date);
    let [a, b] = [completed[completed.len() - 2], completed[completed.len() - 1]];
    is_same_day(&a.date, &b.date)
}
