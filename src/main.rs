use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use questlog::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "questlog")]
#[command(about = "Questlog - turn your to-do list into daily quests")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.questlog/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database (overrides settings.database_path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Create the profile, or rename the existing one
    Onboard {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "person.circle")]
        avatar: String,
    },

    /// Show level, XP and streak
    Profile,

    /// Extend the daily streak by one
    Streak,

    /// Manage quests
    #[command(subcommand)]
    Quest(QuestCommands),

    /// Show today's challenges
    Challenges,

    /// Manage challenges
    #[command(subcommand)]
    Challenge(ChallengeCommands),

    /// Select the theme (system, light, dark, colorful)
    Theme { name: String },

    /// Delete all quests, challenges and the profile
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum QuestCommands {
    /// Add a quest
    Add {
        title: String,

        /// XP awarded on completion
        #[arg(long, default_value_t = 10)]
        xp: u32,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Deadline, e.g. "2025-05-23 18:00" or "2025-05-23"
        #[arg(long)]
        deadline: Option<String>,
    },

    /// List quests by date
    List,

    /// Complete a quest and collect its XP
    Done {
        /// Quest id or unique prefix
        id: String,
    },

    /// Delete a quest
    Rm {
        /// Quest id or unique prefix
        id: String,
    },
}

#[derive(Subcommand)]
enum ChallengeCommands {
    /// Mark a challenge completed
    Done {
        /// Challenge id or unique prefix
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::global_config_path);
    let config = Config::load_or_default(&config_path)?;

    // Initialize logging: RUST_LOG, then --verbose, then the config
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.settings.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(&config_path, force);
    }

    let mut session = cli::Session::open(config_path, config, cli.db)?;

    let result = match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Onboard { name, avatar } => {
            cli::profile::onboard_command(&mut session, &name, &avatar)
        }
        Commands::Profile => cli::profile::profile_command(&session),
        Commands::Streak => cli::profile::streak_command(&session),
        Commands::Quest(QuestCommands::Add {
            title,
            xp,
            description,
            category,
            deadline,
        }) => cli::quest::add_command(
            &session,
            cli::quest::AddArgs {
                title,
                xp,
                description,
                category,
                deadline,
            },
        ),
        Commands::Quest(QuestCommands::List) => cli::quest::list_command(&session),
        Commands::Quest(QuestCommands::Done { id }) => cli::quest::done_command(&session, &id),
        Commands::Quest(QuestCommands::Rm { id }) => cli::quest::rm_command(&session, &id),
        Commands::Challenges => cli::challenge::list_command(&session),
        Commands::Challenge(ChallengeCommands::Done { id }) => {
            cli::challenge::done_command(&session, &id)
        }
        Commands::Theme { name } => cli::theme::theme_command(&mut session, &name),
        Commands::Reset { yes } => cli::reset::reset_command(&mut session, yes),
    };

    // Flush committed state before exiting, even after an error
    if let Err(e) = session.app.flush() {
        tracing::warn!("Final flush failed: {}", e);
    }
    result
}
