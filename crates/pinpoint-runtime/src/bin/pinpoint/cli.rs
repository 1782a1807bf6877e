//! CLI definitions for pinpoint.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "pinpoint",
    version,
    about = "Run scripts with production breakpoints",
    infer_subcommands = true,
    after_help = "Examples:\n  pinpoint run app/index.php --breakpoints bp.toml\n  pinpoint validate '$user[\"id\"] > 3' 'count($items)'\n  pinpoint inject app/index.php --line 12"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a script, printing its output and the captured breakpoints.
    Run {
        /// Entry script.
        entry: PathBuf,
        /// Debugger configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// TOML file with `[[snapshot]]` and `[[logpoint]]` tables.
        #[arg(long)]
        breakpoints: Option<PathBuf>,
        /// Base directory for relative breakpoint filenames.
        #[arg(long)]
        source_root: Option<PathBuf>,
        /// Number of requests to run against the same code cache.
        #[arg(long, default_value_t = 1)]
        requests: usize,
    },
    /// Check conditions or watch expressions against the sandbox.
    Validate {
        /// Expressions to check.
        #[arg(required = true)]
        expressions: Vec<String>,
        /// Debugger configuration file (for allow-lists).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Inject a probe into a file and print the resulting tree.
    Inject {
        /// Source file.
        file: PathBuf,
        /// Target line.
        #[arg(long)]
        line: u32,
        /// Inject a logpoint probe instead of a snapshot probe.
        #[arg(long, action = ArgAction::SetTrue)]
        logpoint: bool,
    },
}
