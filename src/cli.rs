//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the lake.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands};
pub use presentation::{format_branches, format_pools};
pub use route::{RunContext, RunOptions};
