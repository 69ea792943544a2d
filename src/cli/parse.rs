//! CLI parse: clap types for lakelog. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lakelog - branches and commit history for a data lake
#[derive(Parser, Debug)]
#[command(name = "lakelog")]
#[command(about = "Commit log, branches and HEAD state for a versioned data lake")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds the HEAD file and workspace config)
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Lake directory (overrides lake.path from config)
    #[arg(long, global = true, env = "LAKELOG_LAKE")]
    pub lake: Option<PathBuf>,

    /// Use this pool[@branch] instead of HEAD for this invocation
    #[arg(long = "use", global = true, value_name = "REF")]
    pub use_ref: Option<String>,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Authentication token
    #[arg(long, global = true, env = "LAKELOG_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Abort the command after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the lake directory
    Init,
    /// Create a pool with a main branch
    Create {
        /// Pool name
        name: String,
    },
    /// List pools
    Ls {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List branches of the HEAD pool, or create a branch
    Branch {
        /// Name of the branch to create (omit to list)
        name: Option<String>,
        /// Reference the new branch starts at (default: HEAD)
        #[arg(long, value_name = "REF")]
        from: Option<String>,
        /// Output format for listings (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print or set the working pool and branch
    Use {
        /// pool, pool@branch, @branch or a commit id
        #[arg(value_name = "REF")]
        refs: Vec<String>,
    },
    /// Append a commit to the HEAD branch
    Commit {
        /// Commit message
        #[arg(short, long, default_value = "")]
        message: String,
        /// Commit author (default: the authenticated user)
        #[arg(long)]
        user: Option<String>,
        /// Add a data object, given as SIZE:COUNT
        #[arg(long, value_name = "SIZE:COUNT")]
        add: Vec<String>,
        /// Delete a data object by id
        #[arg(long, value_name = "ID")]
        delete: Vec<String>,
        /// Record metadata, given as KEY=VALUE
        #[arg(long, value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },
    /// Print commit history, newest first
    Log {
        /// Reference to read from (default: HEAD)
        #[arg(value_name = "REF")]
        refs: Vec<String>,
        /// Stop before this commit (branch name or commit id)
        #[arg(long, value_name = "REF")]
        stop: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Print at most this many commits
        #[arg(long)]
        limit: Option<usize>,
    },
}
