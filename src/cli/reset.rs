//! Reset command implementation

use anyhow::{Result, bail};

use super::Session;

/// Delete every quest, challenge and the profile, and clear onboarding
pub fn reset_command(session: &mut Session, yes: bool) -> Result<()> {
    if !yes {
        bail!("This deletes all data. Re-run with --yes to confirm.");
    }

    session.app.reset_all()?;
    session.config.settings.onboarding_complete = false;
    session.save_config()?;

    println!("All data deleted.");
    Ok(())
}
