//! Watch configuration: per-host connection specs and global poll settings
//!
//! Configuration is loaded once at start-up from a TOML file (or built
//! programmatically), validated, and never mutated afterwards. Malformed
//! entries are rejected here, before the scheduler starts, rather than
//! failing mid-tick.

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{WatchError, WatchResult};

/// Default SSH username
pub const DEFAULT_USERNAME: &str = "root";

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default per-host command timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default seconds between poll ticks
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Default CPU usage threshold percent
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Default sampling command: two-sample `vmstat`, last line only.
///
/// The second sample reflects current activity (the first is the
/// since-boot average), and `tail -1` strips the headers.
pub const DEFAULT_SAMPLE_CMD: &str = "vmstat 1 2 | tail -1";

/// Connection details for one monitored host
///
/// One instance per configured host, created at start-up and never
/// mutated. When both `key_path` and `password` are set, key
/// authentication is attempted first and the password is the fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct HostSpec {
    /// Target hostname or IP
    pub host: String,
    /// SSH username (default: `root`)
    #[serde(default = "default_username")]
    pub username: String,
    /// SSH port (default: 22)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to an SSH private key file; `~` is expanded
    #[serde(default)]
    pub key_path: Option<String>,
    /// SSH password, used when the key is absent or unusable
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Per-command timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HostSpec {
    /// Creates a spec for `host` with all defaults
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: default_username(),
            port: default_port(),
            key_path: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Global poll settings shared by all hosts
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatchSettings {
    /// Seconds between poll ticks (default: 10)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// CPU usage threshold percent used to set `crossed` (default: 80.0)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// If true, emit a sample event only when the threshold is crossed;
    /// error events are emitted regardless (default: false)
    #[serde(default)]
    pub emit_only_above: bool,
    /// Command used to sample CPU (default: [`DEFAULT_SAMPLE_CMD`])
    #[serde(default = "default_sample_cmd")]
    pub sample_cmd: String,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

const fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn default_sample_cmd() -> String {
    DEFAULT_SAMPLE_CMD.to_string()
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            threshold: default_threshold(),
            emit_only_above: false,
            sample_cmd: default_sample_cmd(),
        }
    }
}

/// Complete watcher configuration: host list plus global settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchConfig {
    /// Hosts to poll, in configuration order
    #[serde(default)]
    pub hosts: Vec<HostSpec>,
    /// Global poll settings
    #[serde(flatten)]
    pub settings: WatchSettings,
}

impl WatchConfig {
    /// Loads and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] if the file cannot be read or
    /// parsed, or if validation fails.
    pub fn load(path: &Path) -> WatchResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| WatchError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| WatchError::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// An empty host list is the only condition that is fatal to the
    /// whole poller; range errors on the other fields are rejected here
    /// too so the scheduler never starts with a bad configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] describing the first problem found.
    pub fn validate(&self) -> WatchResult<()> {
        if self.hosts.is_empty() {
            return Err(WatchError::Config("'hosts' list is required".into()));
        }
        if self.settings.interval_secs == 0 {
            return Err(WatchError::Config("'interval_secs' must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&self.settings.threshold) {
            return Err(WatchError::Config(format!(
                "'threshold' must be between 0 and 100, got {}",
                self.settings.threshold
            )));
        }
        if self.settings.sample_cmd.trim().is_empty() {
            return Err(WatchError::Config("'sample_cmd' must not be empty".into()));
        }
        for spec in &self.hosts {
            if spec.host.trim().is_empty() {
                return Err(WatchError::Config("host entry with empty 'host' field".into()));
            }
            if spec.timeout_secs == 0 {
                return Err(WatchError::Config(format!(
                    "'timeout_secs' for {} must be at least 1",
                    spec.host
                )));
            }
        }
        Ok(())
    }
}
