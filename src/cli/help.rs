//! CLI help: command names for log fields.

use crate::cli::parse::Commands;

/// Stable name of a command, as recorded in logs.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Create { .. } => "create",
        Commands::Ls { .. } => "ls",
        Commands::Branch { .. } => "branch",
        Commands::Use { .. } => "use",
        Commands::Commit { .. } => "commit",
        Commands::Log { .. } => "log",
    }
}
