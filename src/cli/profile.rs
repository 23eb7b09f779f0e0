//! Profile, onboarding and streak commands

use anyhow::{Result, bail};

use super::Session;

pub fn onboard_command(session: &mut Session, name: &str, avatar: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Name must not be empty");
    }

    let user = session.app.ledger().onboard(name, avatar)?;
    if !session.config.settings.onboarding_complete {
        session.config.settings.onboarding_complete = true;
        session.save_config()?;
    }

    println!("Welcome, {}! You are level {}.", user.name, user.level);
    Ok(())
}

pub fn profile_command(session: &Session) -> Result<()> {
    let ledger = session.app.ledger();
    let (Some(user), Some(progress)) = (ledger.user(), ledger.progress()) else {
        println!("No profile yet. Run `questlog onboard --name <NAME>` first.");
        return Ok(());
    };

    let quests = session.app.quests().quests();
    let completed = quests.iter().filter(|q| q.is_completed).count();

    println!("{} ({})", user.name, user.avatar);
    println!(
        "  Level {}  {}  {}/{} XP",
        progress.level,
        xp_bar(progress.progress_to_next(), 20),
        progress.current_xp,
        progress.threshold
    );
    println!("  Streak: {} days", user.streak);
    println!("  Quests completed: {}/{}", completed, quests.len());
    if !user.unlocked_themes.is_empty() {
        let themes: Vec<&str> = user.unlocked_themes.iter().map(|t| t.as_str()).collect();
        println!("  Themes: {}", themes.join(", "));
    }
    Ok(())
}

pub fn streak_command(session: &Session) -> Result<()> {
    let count = session.app.ledger().record_streak_tick()?;
    println!("Streak: {} days", count);
    Ok(())
}

fn xp_bar(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
