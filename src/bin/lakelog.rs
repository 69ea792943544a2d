//! lakelog CLI Binary
//!
//! Command-line interface for the lake commit log.

use clap::Parser;
use lakelog::cli::{exit_code, map_error, Cli, RunContext, RunOptions};
use lakelog::config::ConfigLoader;
use lakelog::logging::{init_logging, LoggingConfig};
use lakelog::StorageError;
use std::io::{IsTerminal, Write};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!(command = lakelog::cli::command_name(&cli.command), "lakelog starting");

    let mut options = RunOptions::from_cli(&cli);
    options.color = std::io::stdout().is_terminal();

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone(), options) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(exit_code(&e));
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = context
        .execute(&cli.command, &mut out)
        .and_then(|()| out.flush().map_err(|e| StorageError::from(e).into()));
    if let Err(e) = result {
        error!("Command failed: {}", e);
        eprintln!("{}", map_error(&e));
        process::exit(exit_code(&e));
    }
    info!("Command completed successfully");
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }
    if cli.quiet && cli.log_level.is_none() && !cli.verbose {
        config.level = "off".to_string();
    }

    config
}
