//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// cpuwatch command-line interface for watching AIX CPU utilization
#[derive(Parser)]
#[command(name = "cpuwatch")]
#[command(version, about = "Watch CPU utilization on AIX hosts over SSH and emit events")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (TOML)
    #[arg(short, long, global = true, env = "CPUWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except events and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Poll the configured hosts on a fixed interval
    #[command(about = "Poll hosts continuously, printing one JSON event per line")]
    Watch {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Poll every host once and exit
    #[command(about = "Sample each host a single time; non-zero exit if any host failed")]
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate a man page
    #[command(about = "Generate a man page on stdout")]
    Manpage,
}

/// Host and poll options shared by `watch` and `check`.
///
/// When `--host` is given, the flags below describe those hosts and the
/// config file's host list is ignored; otherwise hosts come from the
/// config file. Poll options override the config file in either case.
#[derive(Args)]
pub struct SourceArgs {
    /// Host to poll (repeatable); overrides the config file host list
    #[arg(short = 'H', long = "host", value_name = "HOST")]
    pub hosts: Vec<String>,

    /// SSH username for hosts given with --host
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH port for hosts given with --host
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to an SSH private key for hosts given with --host
    #[arg(short, long)]
    pub key: Option<PathBuf>,

    /// Prompt for an SSH password applied to hosts given with --host
    #[arg(long)]
    pub ask_password: bool,

    /// Per-host command timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds between poll ticks
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// CPU usage threshold percent
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Emit sample events only when the threshold is crossed
    #[arg(long)]
    pub emit_only_above: bool,

    /// Command used to sample CPU on the remote host
    #[arg(long, value_name = "CMD")]
    pub sample_cmd: Option<String>,
}
