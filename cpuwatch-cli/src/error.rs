//! CLI error types and exit codes.

use cpuwatch_core::WatchError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or other non-polling errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Poll failure - one or more hosts could not be sampled
    pub const POLL_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more hosts failed to poll
    #[error("Poll failed: {0}")]
    PollFailed(String),

    /// Event serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WatchError> for CliError {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::Config(msg) => Self::Config(msg),
            other => Self::PollFailed(other.to_string()),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, serialization, IO)
    /// - 2: Poll failure (host unreachable or sampling failed)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::PollFailed(_) => exit_codes::POLL_FAILURE,
            Self::Config(_) | Self::Serialize(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
