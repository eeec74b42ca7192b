//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Run the download orchestrator over stdin/stdout.
///
/// Reads one JSON request or menu click per line and writes replies and
/// broadcasts as JSON lines. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Profile file (key = value lines); defaults to the user config directory
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Delay between progress polls in milliseconds (1-60000)
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..=60000))]
    pub poll_interval_ms: u64,

    /// Application name used as notification title
    #[arg(long, default_value = "Download Orchestrator")]
    pub app_name: String,

    /// Accept download confirmations without asking
    #[arg(short = 'y', long)]
    pub assume_yes: bool,
}
