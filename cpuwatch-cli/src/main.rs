//! cpuwatch CLI - watch CPU utilization on AIX hosts over SSH
//!
//! Polls `vmstat` on the configured hosts at a fixed interval and prints
//! one JSON event per line, matching the event layout consumed by
//! downstream rule engines. Also provides a one-shot `check` mode plus
//! shell completion and man page generation.

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = commands::dispatch(cli.config.as_deref(), cli.command).await;

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
