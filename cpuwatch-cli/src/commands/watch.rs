//! The continuous `watch` command.

use cpuwatch_core::config::WatchConfig;
use cpuwatch_core::session::ssh_session_factory;
use cpuwatch_core::watcher::start_watcher;

use crate::error::CliError;

/// Polls the configured hosts until interrupted, printing one JSON event
/// per line to stdout.
///
/// Ctrl-C requests a graceful stop; the watcher finishes the current
/// tick, closes its sessions, and the event stream drains before exit.
pub async fn cmd_watch(config: WatchConfig) -> Result<(), CliError> {
    let host_count = config.hosts.len();
    let (handle, mut events) = start_watcher(config, ssh_session_factory())?;
    tracing::info!(hosts = host_count, "cpu watch started");

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested, finishing current tick");
            handle.stop().await;
        }
    });

    while let Some(event) = events.recv().await {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
