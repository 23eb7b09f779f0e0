//! Daily challenge commands

use anyhow::Result;

use super::{Session, resolve_id, short_id};

pub fn list_command(session: &Session) -> Result<()> {
    let challenges = session.app.refresh_challenges()?;
    let done = challenges.iter().filter(|c| c.is_completed).count();

    println!("Daily challenges ({}/{} done):\n", done, challenges.len());
    for challenge in &challenges {
        let mark = if challenge.is_completed { "x" } else { " " };
        println!(
            "  [{}] {} {} (+{} XP)",
            mark,
            short_id(&challenge.id),
            challenge.description(),
            challenge.reward_xp
        );
    }
    Ok(())
}

pub fn done_command(session: &Session, id: &str) -> Result<()> {
    let challenges = session.app.refresh_challenges()?;
    let id = resolve_id(id, challenges.iter().map(|c| c.id), "challenge")?;

    session.app.complete_challenge(id)?;
    println!("Challenge completed");
    Ok(())
}
