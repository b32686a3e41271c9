#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Command-line interface for parking and restoring work in progress via the
//! libwork crate.

use std::{
    env, fs,
    io::{self, IsTerminal, Write},
    process,
};

use anyhow::{Context, Result};
use clap::Parser;
use libwork::{
    ALL_TARGETS, CURRENT_DIR_TARGET, Checkpointer, FileStore, Git, Settings, SettingsOverrides,
    WorkError,
};
use tracing_subscriber::EnvFilter;

/// Command-line argument definitions.
mod args;
/// Subcommand implementations.
mod commands;
/// Terminal output rendering.
mod output;
/// Rendering of library outcomes.
mod ui;

use args::{Cli, Commands};
use output::{Output, Quiet, Terminal};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "WORK_LOG";

/// Install the diagnostic logger. Diagnostics go to stderr so they never mix
/// with command output.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("Failed to initialise logging: {err}");
    }
}

/// CLI entrypoint.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine color output preference early for error handling
    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    let output: Box<dyn Output> = if cli.quiet {
        Box::new(Quiet)
    } else {
        Box::new(Terminal::new(color))
    };

    let exit_code = match run(cli, output.as_ref()) {
        Ok(code) => code,
        Err(e) => {
            // Reset any existing colors only if color was enabled and stdout is a TTY
            if color && io::stdout().is_terminal() {
                print!("\x1b[0m");
                if let Err(flush_err) = io::stdout().flush() {
                    eprintln!("Failed to flush stdout while resetting colors: {flush_err}");
                }
            }
            if let Err(display_err) = output.fail(&format!("{e:#}")) {
                eprintln!("Failed to report error via output handler: {display_err:#}");
            }
            e.downcast_ref::<WorkError>()
                .map_or(1, WorkError::exit_code)
        }
    };

    if let Err(finish_err) = output.finish() {
        eprintln!("Failed to flush output handler: {finish_err:#}");
    }
    if exit_code != 0 {
        process::exit(exit_code);
    }
    Ok(())
}

/// Execute the selected CLI command, returning the process exit code.
fn run(cli: Cli, output: &dyn Output) -> Result<i32> {
    let settings = Settings::load(SettingsOverrides {
        config_file: cli.config_path(),
        tracking_file: cli.tracking_file_path(),
        remote: cli.remote.clone(),
        primary_branch: cli.primary.clone(),
        force_push: cli.no_force.then_some(false),
    })?;
    tracing::debug!(
        tracking_file = %settings.tracking_file.display(),
        remote = %settings.remote,
        primary = %settings.primary_branch,
        "loaded settings"
    );

    let cwd = env::current_dir().context("Failed to read the current directory")?;
    let cwd = fs::canonicalize(&cwd).unwrap_or(cwd);

    let work = Checkpointer::new(
        Git,
        FileStore::new(settings.tracking_file.clone()),
        settings.primary_branch.clone(),
    );

    match cli.command {
        Commands::Start { repository } => commands::start(
            &work,
            output,
            repository.as_deref().unwrap_or(CURRENT_DIR_TARGET),
            &settings.remote,
            &cwd,
        ),
        Commands::End { repository } => commands::end(
            &work,
            output,
            repository.as_deref().unwrap_or(ALL_TARGETS),
            &commands::Publish {
                remote: &settings.remote,
                force: settings.force_push,
            },
            &cwd,
        ),
        Commands::List => commands::list(&work, output).map(|()| 0),
    }
}
