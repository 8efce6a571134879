//! Remote session abstraction
//!
//! A session is the persistent per-host remote-execution handle, reused
//! across poll ticks. Each session is exclusively owned by one host's
//! poll line; sessions are never shared between hosts. The trait exists
//! so the scheduler can be driven by a mock transport in tests; the
//! production implementation is [`SshSession`].

mod ssh;

use async_trait::async_trait;

use crate::error::WatchResult;

pub use ssh::{SshSession, ssh_session_factory};

/// Persistent command-execution handle for one remote host
#[async_trait]
pub trait RemoteSession: Send {
    /// Establishes the transport and authenticates.
    ///
    /// Idempotent: calling on an already-connected session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an auth or connect error when the host is unreachable or
    /// rejects the configured credentials.
    async fn connect(&mut self) -> WatchResult<()>;

    /// Runs a command on the remote host and returns its decoded stdout.
    ///
    /// Connects lazily if the session is not yet established.
    ///
    /// # Errors
    ///
    /// Returns a command error when the remote side writes to stderr
    /// while producing no stdout, a timeout error when the per-host
    /// timeout elapses, or a connect/auth error from lazy connection.
    async fn run(&mut self, command: &str) -> WatchResult<String>;

    /// Releases all session resources.
    ///
    /// Safe to call multiple times or on a never-connected session.
    async fn close(&mut self);
}
