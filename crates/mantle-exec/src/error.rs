//! Error types for command execution

use std::time::Duration;

/// Result type for mantle-exec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while running an external command.
///
/// A non-zero exit status is not an error at this layer; it is reported
/// through [`crate::CommandOutput`] so callers can decide what it means.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The program could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed
    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child outlived its timeout and was killed
    #[error("Command timed out after {}s: {command}", timeout.as_secs_f64())]
    TimedOut {
        /// Redacted command line
        command: String,
        timeout: Duration,
        /// Output captured before the child was killed
        output: String,
    },
}
