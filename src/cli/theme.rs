//! Theme command implementation

use anyhow::{Result, bail};

use questlog::AppTheme;

use super::Session;

/// Select a theme and record it as unlocked on the profile
pub fn theme_command(session: &mut Session, name: &str) -> Result<()> {
    let Some(theme) = AppTheme::parse(name) else {
        let names: Vec<&str> = AppTheme::all().iter().map(|t| t.as_str()).collect();
        bail!("Unknown theme '{}' (expected one of: {})", name, names.join(", "));
    };

    session.config.settings.theme = theme;
    session.save_config()?;

    if session.app.ledger().user().is_some() && session.app.ledger().unlock_theme(theme)? {
        println!("Unlocked theme {}", theme);
    }
    println!("Theme set to {}", theme);
    Ok(())
}
