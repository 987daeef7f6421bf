//! CLI-specific error types and exit code mapping

use sysfwd_core::error::SysfwdError;
use sysfwd_forwarder::ForwarderError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Logging or metrics setup failed.
    #[error("setup error: {0:#}")]
    Setup(#[from] anyhow::Error),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdin read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from sysfwd-core.
    #[error("{0}")]
    Core(#[from] SysfwdError),

    /// Forwarder construction or runtime error.
    #[error("forwarder error: {0}")]
    Forwarder(#[from] ForwarderError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                  |
    /// |------|--------------------------|
    /// | 0    | Success                  |
    /// | 1    | General / command error  |
    /// | 2    | Configuration error      |
    /// | 10   | IO error                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Forwarder(ForwarderError::Config { .. }) => 2,
            Self::Io(_) => 10,
            Self::Command(_)
            | Self::Setup(_)
            | Self::JsonSerialize(_)
            | Self::Core(_)
            | Self::Forwarder(_) => 1,
        }
    }
}
