//! Init command implementation

use anyhow::Result;
use std::path::Path;

use questlog::config::Config;

/// Write the default config file
pub fn init_command(config_path: &Path, force: bool) -> Result<()> {
    if Config::init(config_path, force)? {
        println!("Created {}", config_path.display());
    } else {
        println!(
            "Config already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }
    Ok(())
}
