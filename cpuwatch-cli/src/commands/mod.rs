//! Command handler modules for the CLI.

mod check;
mod completions;
mod manpage;
mod watch;

use std::path::{Path, PathBuf};

use cpuwatch_core::config::{HostSpec, WatchConfig};
use secrecy::SecretString;

use crate::cli::{Commands, SourceArgs};
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub async fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Watch { source } => watch::cmd_watch(build_config(config_path, &source)?).await,
        Commands::Check { source } => check::cmd_check(build_config(config_path, &source)?).await,
        Commands::Completions { shell } => completions::cmd_completions(shell),
        Commands::Manpage => manpage::cmd_manpage(),
    }
}

/// Assembles the effective configuration from the config file and flags.
///
/// A missing explicit `--config` path is an error; the default path is
/// used only when it exists, so flag-only invocations work on machines
/// with no config file at all.
fn build_config(config_path: Option<&Path>, source: &SourceArgs) -> Result<WatchConfig, CliError> {
    let mut config = match config_path {
        Some(path) => WatchConfig::load(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => WatchConfig::load(&path)?,
            None => WatchConfig::default(),
        },
    };

    let password = if source.ask_password {
        let raw = rpassword::prompt_password("SSH password: ")
            .map_err(|e| CliError::Config(format!("cannot read password: {e}")))?;
        Some(SecretString::from(raw))
    } else {
        None
    };

    apply_overrides(&mut config, source, password);
    Ok(config)
}

/// Default configuration file location (`<config dir>/cpuwatch/config.toml`)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cpuwatch").join("config.toml"))
}

/// Applies command-line overrides on top of the file configuration.
fn apply_overrides(config: &mut WatchConfig, source: &SourceArgs, password: Option<SecretString>) {
    if source.hosts.is_empty() {
        // Config-file hosts; only the timeout is overridable in bulk
        if let Some(timeout) = source.timeout {
            for spec in &mut config.hosts {
                spec.timeout_secs = timeout;
            }
        }
    } else {
        config.hosts = source
            .hosts
            .iter()
            .map(|host| {
                let mut spec = HostSpec::new(host.clone());
                if let Some(user) = &source.user {
                    spec.username = user.clone();
                }
                if let Some(port) = source.port {
                    spec.port = port;
                }
                if let Some(key) = &source.key {
                    spec.key_path = Some(key.display().to_string());
                }
                if let Some(timeout) = source.timeout {
                    spec.timeout_secs = timeout;
                }
                spec.password.clone_from(&password);
                spec
            })
            .collect();
    }

    if let Some(interval) = source.interval {
        config.settings.interval_secs = interval;
    }
    if let Some(threshold) = source.threshold {
        config.settings.threshold = threshold;
    }
    if source.emit_only_above {
        config.settings.emit_only_above = true;
    }
    if let Some(cmd) = &source.sample_cmd {
        config.settings.sample_cmd.clone_from(cmd);
    }
}
