//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod hero;

pub use hero::HeroCommands;

use anyhow::Result;
use clap::Subcommand;
use heroes_store::DatabaseExecutor;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Hero management
    Hero {
        #[command(subcommand)]
        command: HeroCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `db` - Executor the repository runs against
pub async fn handle_command<E: DatabaseExecutor>(command: Commands, db: &E) -> Result<()> {
    match command {
        Commands::Hero { command } => hero::handle_hero_command(command, db).await,
    }
}
