//! SSH session over the OpenSSH client binary
//!
//! Commands run through `ssh` (or `sshpass -e ssh` for password
//! authentication) rather than an in-process SSH library. A control
//! master connection is established on first use and multiplexed for
//! every subsequent command, so each host holds at most one transport
//! connection that is reused across poll ticks.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::process::Command;

use super::RemoteSession;
use crate::config::HostSpec;
use crate::error::{WatchError, WatchResult};

/// Extra seconds on top of `ConnectTimeout` to bound the auth exchange
const AUTH_GRACE_SECS: u64 = 5;

/// Bound on the control-master teardown command
const CLOSE_TIMEOUT_SECS: u64 = 5;

/// Authentication method for one connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMethod {
    /// Private key file with `BatchMode=yes`
    Key,
    /// Password via `sshpass -e` with pubkey auth disabled
    Password,
    /// Agent or default identities with `BatchMode=yes`
    Default,
}

/// Persistent SSH connection to one host
///
/// Lazily connected on first [`RemoteSession::run`], reused across
/// ticks, torn down exactly once on shutdown. The underlying transport
/// is an OpenSSH control master; its socket lives in the system temp
/// directory and is keyed by process id so repeated connects within one
/// process reuse the same path instead of leaking sockets.
#[derive(Debug)]
pub struct SshSession {
    spec: HostSpec,
    control_path: PathBuf,
    use_sshpass: bool,
    connected: bool,
}

impl SshSession {
    /// Creates a session for `spec` without connecting.
    ///
    /// `use_sshpass` signals that the `sshpass` helper is available for
    /// password authentication; see [`ssh_session_factory`].
    #[must_use]
    pub fn new(spec: HostSpec, use_sshpass: bool) -> Self {
        let control_path = control_socket_path(&spec.host, spec.port);
        Self {
            spec,
            control_path,
            use_sshpass,
            connected: false,
        }
    }

    /// `user@host` destination argument
    fn destination(&self) -> String {
        format!("{}@{}", self.spec.username, self.spec.host)
    }

    /// Common options shared by the master and multiplexed commands
    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".into(),
            "StrictHostKeyChecking=no".into(),
            "-o".into(),
            format!("ControlPath={}", self.control_path.display()),
        ];
        if self.spec.port != 22 {
            args.push("-p".into());
            args.push(self.spec.port.to_string());
        }
        args
    }

    /// Arguments for the control-master connection attempt
    fn master_args(&self, method: AuthMethod) -> Vec<String> {
        let mut args = self.base_args();
        args.extend([
            "-o".into(),
            "ControlMaster=yes".into(),
            "-o".into(),
            "ControlPersist=yes".into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.spec.timeout_secs),
        ]);
        match method {
            AuthMethod::Key => {
                let key = self.spec.key_path.as_deref().unwrap_or_default();
                args.extend([
                    "-o".into(),
                    "BatchMode=yes".into(),
                    "-o".into(),
                    "IdentitiesOnly=yes".into(),
                    "-i".into(),
                    shellexpand::tilde(key).into_owned(),
                ]);
            }
            AuthMethod::Password => {
                args.extend([
                    "-o".into(),
                    "PreferredAuthentications=password".into(),
                    "-o".into(),
                    "PubkeyAuthentication=no".into(),
                ]);
            }
            AuthMethod::Default => {
                args.extend(["-o".into(), "BatchMode=yes".into()]);
            }
        }
        // -N -f: no remote command, background after authentication
        args.extend(["-N".into(), "-f".into(), self.destination()]);
        args
    }

    /// Attempts one control-master connection with the given method.
    async fn spawn_master(&self, method: AuthMethod) -> WatchResult<()> {
        let mut cmd = if method == AuthMethod::Password {
            let mut c = Command::new("sshpass");
            c.arg("-e").arg("ssh");
            if let Some(password) = &self.spec.password {
                c.env("SSHPASS", password.expose_secret());
            }
            c
        } else {
            Command::new("ssh")
        };
        cmd.args(self.master_args(method))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let budget = Duration::from_secs(self.spec.timeout_secs + AUTH_GRACE_SECS);
        match tokio::time::timeout(budget, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(classify_connect_failure(&self.spec.host, stderr.trim()))
            }
            Ok(Err(e)) => Err(WatchError::Connect(format!(
                "failed to spawn ssh for {}: {e}",
                self.spec.host
            ))),
            Err(_) => Err(WatchError::Connect(format!(
                "connection to {} timed out after {}s",
                self.spec.host,
                budget.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn connect(&mut self) -> WatchResult<()> {
        if self.connected {
            return Ok(());
        }

        // Key first; silently downgrade to password when the key fails
        // and a password is configured. The downgrade is surfaced in the
        // log, not on the event stream.
        let mut attempts = Vec::new();
        if self.spec.key_path.is_some() {
            attempts.push(AuthMethod::Key);
        }
        if self.spec.password.is_some() {
            attempts.push(AuthMethod::Password);
        }
        if attempts.is_empty() {
            attempts.push(AuthMethod::Default);
        }

        let mut last_err = None;
        for (i, method) in attempts.iter().enumerate() {
            if *method == AuthMethod::Password && !self.use_sshpass {
                last_err = Some(WatchError::Auth(format!(
                    "password authentication for {} requires sshpass",
                    self.spec.host
                )));
                continue;
            }
            match self.spawn_master(*method).await {
                Ok(()) => {
                    if i > 0 {
                        tracing::warn!(
                            host = %self.spec.host,
                            "key authentication unusable, connected with password"
                        );
                    }
                    self.connected = true;
                    return Ok(());
                }
                Err(err) => {
                    tracing::debug!(
                        host = %self.spec.host,
                        method = ?method,
                        error = %err,
                        "connection attempt failed"
                    );
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            WatchError::Connect(format!("no usable authentication for {}", self.spec.host))
        }))
    }

    async fn run(&mut self, command: &str) -> WatchResult<String> {
        self.connect().await?;

        let mut cmd = Command::new("ssh");
        cmd.args(self.base_args())
            .arg("-o")
            .arg("BatchMode=yes")
            .arg(self.destination())
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let budget = Duration::from_secs(self.spec.timeout_secs);
        match tokio::time::timeout(budget, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                if control_connection_lost(stderr) {
                    // Master died underneath us; reconnect lazily next tick
                    self.connected = false;
                    return Err(WatchError::Connect(format!(
                        "control connection to {} lost: {stderr}",
                        self.spec.host
                    )));
                }
                if !stderr.is_empty() && stdout.is_empty() {
                    // vmstat prints headers to stdout; stderr with empty
                    // stdout means the command itself failed
                    return Err(WatchError::Command {
                        host: self.spec.host.clone(),
                        stderr: stderr.to_string(),
                    });
                }
                Ok(stdout)
            }
            Ok(Err(e)) => Err(WatchError::Connect(format!(
                "failed to spawn ssh for {}: {e}",
                self.spec.host
            ))),
            Err(_) => Err(WatchError::Timeout(self.spec.timeout_secs)),
        }
    }

    async fn close(&mut self) {
        if self.connected {
            let mut cmd = Command::new("ssh");
            cmd.args(self.base_args())
                .arg("-O")
                .arg("exit")
                .arg(self.destination())
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            let budget = Duration::from_secs(CLOSE_TIMEOUT_SECS);
            if tokio::time::timeout(budget, cmd.output()).await.is_err() {
                tracing::debug!(host = %self.spec.host, "control master teardown timed out");
            }
            self.connected = false;
        }
        // Best-effort removal; absent when never connected
        let _ = std::fs::remove_file(&self.control_path);
    }
}

/// Builds a session factory for the scheduler.
///
/// `sshpass` availability is probed once here, at factory creation time,
/// so individual connection attempts don't repeat the check.
#[must_use]
pub fn ssh_session_factory() -> impl Fn(&HostSpec) -> SshSession {
    let sshpass_available = std::process::Command::new("sshpass")
        .arg("-V")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok();

    move |spec: &HostSpec| SshSession::new(spec.clone(), sshpass_available)
}

/// Control socket path for one host, unique per process
fn control_socket_path(host: &str, port: u16) -> PathBuf {
    let safe: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    std::env::temp_dir().join(format!("cpuwatch-{}-{safe}-{port}.sock", std::process::id()))
}

/// Maps a failed master attempt to an auth or connect error
fn classify_connect_failure(host: &str, stderr: &str) -> WatchError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("permission denied") || lowered.contains("authentication") {
        WatchError::Auth(format!("{host}: {stderr}"))
    } else {
        WatchError::Connect(format!("{host}: {stderr}"))
    }
}

/// Detects stderr patterns that mean the control master is gone
fn control_connection_lost(stderr: &str) -> bool {
    stderr.contains("Control socket connect")
        || stderr.contains("mux_client")
        || stderr.contains("Connection to master closed")
}
