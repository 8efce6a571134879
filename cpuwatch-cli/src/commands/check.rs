//! The one-shot `check` command.

use cpuwatch_core::config::WatchConfig;
use cpuwatch_core::session::ssh_session_factory;
use cpuwatch_core::watcher::poll_once;

use crate::error::CliError;

/// Samples every configured host once, printing the resulting events.
///
/// Exits with the poll-failure code when any host produced an error
/// event, so the command can gate scripts and health checks.
pub async fn cmd_check(config: WatchConfig) -> Result<(), CliError> {
    let events = poll_once(&config, ssh_session_factory()).await?;
    for event in &events {
        println!("{}", serde_json::to_string(event)?);
    }

    let failed = events.iter().filter(|e| e.is_error()).count();
    if failed > 0 {
        return Err(CliError::PollFailed(format!(
            "{failed} of {} host(s) could not be sampled",
            events.len()
        )));
    }
    Ok(())
}
