//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Stdin marker for `--input`.
pub const STDIN_INPUT: &str = "-";

#[derive(Parser, Debug, Clone)]
#[command(name = "driveway-monitor")]
#[command(about = "Watches a driveway for arriving objects and sends notifications")]
pub struct Args {
    /// Path to the JSON config file
    #[arg(long, env = "DMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print debug-level logs (to stderr)
    #[arg(long)]
    pub debug: bool,

    /// Print notifications to stdout; disable ntfy
    #[arg(long)]
    pub print: bool,

    /// Newline-delimited JSON detection records; `-` reads stdin
    #[arg(long, default_value = STDIN_INPUT)]
    pub input: String,
}
