use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("color_mode")
        .args(["color", "no_color"])
))]
/// Top-level CLI options for work.
pub struct Cli {
    /// Git remote checkpoints are pushed to [default: private]
    #[arg(short, long, global = true, value_name = "REMOTE")]
    pub remote: Option<String>,

    /// Primary branch restores reset onto [default: master]
    #[arg(long, global = true, value_name = "BRANCH")]
    pub primary: Option<String>,

    /// Override the tracking file location
    #[arg(long, global = true, value_name = "FILE")]
    pub tracking_file: Option<String>,

    /// Override the config file location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Push checkpoints without --force
    #[arg(long = "no-force", global = true)]
    pub no_force: bool,

    /// Enable colored output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Suppress all output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Increase diagnostic logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    /// The primary command to execute.
    pub command: Commands,
}

#[derive(Subcommand)]
/// CLI subcommands supported by work.
pub enum Commands {
    /// Restore parked work and resume on the primary branch
    #[command(alias = "s")]
    Start {
        /// Repository to restore: ".", a repository root, or "all" [default: .]
        repository: Option<String>,
    },

    /// Park uncommitted work on the checkpoint branch
    #[command(alias = "e")]
    End {
        /// Repository to park: ".", a repository root, or "all" [default: all]
        repository: Option<String>,
    },

    /// Show tracked repositories and their checkpoint state
    #[command(alias = "ls")]
    List,
}

impl Cli {
    /// Expand the tracking file override, if any.
    pub fn tracking_file_path(&self) -> Option<PathBuf> {
        self.tracking_file.as_deref().map(libwork::expand_tilde)
    }

    /// Expand the config file override, if any.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.as_deref().map(libwork::expand_tilde)
    }
}
