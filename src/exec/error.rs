// ABOUTME: External command error types with SNAFU pattern.
// ABOUTME: Distinguishes missing tools, spawn failures and non-zero exits.

use snafu::Snafu;

/// Failure to run an external tool to a successful exit.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExecError {
    #[snafu(display("failed to start `{command}`: {source}"))]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("I/O error talking to `{command}`: {source}"))]
    Io {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` exited with {status}: {message}"))]
    NonZeroExit {
        command: String,
        status: String,
        message: String,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    /// The program is not on the execution path.
    NotFound,
    /// The program exists but could not be started.
    Spawn,
    /// Reading or writing the child's pipes failed.
    Io,
    /// The program ran and reported failure.
    NonZeroExit,
}

impl ExecError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ExecErrorKind {
        match self {
            ExecError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ExecErrorKind::NotFound
            }
            ExecError::Spawn { .. } => ExecErrorKind::Spawn,
            ExecError::Io { .. } => ExecErrorKind::Io,
            ExecError::NonZeroExit { .. } => ExecErrorKind::NonZeroExit,
        }
    }

    /// The tool's own error output when it ran and failed, otherwise our description.
    pub fn platform_message(&self) -> String {
        match self {
            ExecError::NonZeroExit { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
