//! Quest commands

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use questlog::quests::NewQuest;
use questlog::{Quest, day};

use super::{Session, resolve_id, short_id};

pub struct AddArgs {
    pub title: String,
    pub xp: u32,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
}

pub fn add_command(session: &Session, args: AddArgs) -> Result<()> {
    let title = args.title.trim().to_string();
    if title.is_empty() {
        bail!("Quest title must not be empty");
    }

    let category = session
        .config
        .resolve_category(args.category.as_deref())
        .ok_or_else(|| {
            anyhow!(
                "Unknown category '{}' (configured: {})",
                args.category.as_deref().unwrap_or_default(),
                session.config.settings.categories.join(", ")
            )
        })?;

    let deadline = args.deadline.as_deref().map(parse_deadline).transpose()?;

    let new = NewQuest {
        title,
        description: args.description.filter(|d| !d.trim().is_empty()),
        xp_value: args.xp,
        category: Some(category),
        deadline,
    };
    let quests = session.app.quests().create(new)?;
    println!("Added quest ({} total)", quests.len());
    Ok(())
}

pub fn list_command(session: &Session) -> Result<()> {
    let quests = session.app.quests().quests();
    if quests.is_empty() {
        println!("No quests yet. Add one with `questlog quest add`.");
        return Ok(());
    }

    let now = Utc::now();
    println!("Quests ({}):\n", quests.len());
    for quest in &quests {
        println!("  {}", format_quest(quest, &now));
        if let Some(desc) = &quest.description {
            println!("      {}", desc);
        }
    }
    Ok(())
}

pub fn done_command(session: &Session, id: &str) -> Result<()> {
    let quests = session.app.quests().quests();
    let id = resolve_id(id, quests.iter().map(|q| q.id), "quest")?;

    let outcome = session.app.complete_quest(id)?;
    let Some(grant) = outcome.grant else {
        println!("Quest already completed");
        return Ok(());
    };

    println!("Quest completed! {} XP at level {}", grant.current_xp, grant.level);
    if let Some(level_up) = grant.level_up {
        println!("Level up! {} -> {}", level_up.old_level, level_up.new_level);
    }
    Ok(())
}

pub fn rm_command(session: &Session, id: &str) -> Result<()> {
    let quests = session.app.quests().quests();
    let id = resolve_id(id, quests.iter().map(|q| q.id), "quest")?;

    let remaining = session.app.quests().delete(id)?;
    println!("Deleted quest ({} left)", remaining.len());
    Ok(())
}

fn format_quest(quest: &Quest, now: &DateTime<Utc>) -> String {
    let mark = if quest.is_completed { "x" } else { " " };
    let when = if day::is_today(&quest.date, now) {
        quest.date.with_timezone(&Local).format("today %H:%M").to_string()
    } else {
        quest.date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
    };

    let mut line = format!(
        "[{}] {} {} ({} XP) {}",
        mark,
        short_id(&quest.id),
        quest.title,
        quest.xp_value,
        when
    );
    if let Some(category) = &quest.category {
        line.push_str(&format!(" #{}", category));
    }
    if quest.deadline.is_some() {
        line.push_str(" [deadline]");
    }
    line
}

/// Parse a local deadline. A bare date means the end of that day.
fn parse_deadline(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .or_else(|_| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()))
        })
        .with_context(|| format!("Invalid deadline '{}', expected YYYY-MM-DD [HH:MM]", input))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Deadline '{}' does not exist in the local timezone", input))
}
