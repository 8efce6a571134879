//! Error types for the CPU watch poller.
//!
//! Every failure a per-host poll can hit maps to one variant here. All of
//! them except [`WatchError::Config`] are caught at the poll-task boundary
//! and converted into an error event; `Config` is the only kind that is
//! fatal before the poll loop starts.

/// Errors that can occur while polling a remote host
#[derive(Debug, Clone, thiserror::Error)]
pub enum WatchError {
    /// Key and/or password authentication was rejected or unusable
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level connection failure (unreachable host, refused, DNS)
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The remote command wrote to stderr while producing no stdout
    #[error("Command error on {host}: {stderr}")]
    Command {
        /// Host the command ran on
        host: String,
        /// Trimmed stderr output from the remote side
        stderr: String,
    },

    /// Fewer than four numeric fields could be extracted from the output
    #[error("Unexpected vmstat output: {0:?}")]
    Parse(String),

    /// The remote command exceeded the per-host timeout
    #[error("Command timed out after {0}s")]
    Timeout(u64),

    /// Invalid configuration, rejected before the poll loop starts
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for watch operations
pub type WatchResult<T> = Result<T, WatchError>;
