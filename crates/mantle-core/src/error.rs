//! Error types for mantle-core

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for mantle-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for a fragment set with nothing to render.
pub const EXIT_SKIPPED: i32 = 10;

/// Why an external process is considered failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFailure {
    /// Exited with a non-zero code (`None` when killed by a signal)
    Exit(Option<i32>),
    /// Killed after exceeding its timeout
    TimedOut(Duration),
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit(Some(code)) => write!(f, "exit code {code}"),
            Self::Exit(None) => f.write_str("terminated by signal"),
            Self::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs_f64()),
        }
    }
}

/// Errors that can occur in mantle-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required directory or file is absent
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// The fragment directory exists but holds no fragments
    #[error("No fragments found in {dir}, nothing to render")]
    EmptyFragmentSet { dir: PathBuf },

    /// No variable source defines the key
    #[error("Key {key} not found in {searched} variable source(s)")]
    KeyNotFound { key: String, searched: usize },

    /// A secret without fallback is missing
    #[error("Secret {key} not found in {path}")]
    SecretNotFound { key: String, path: PathBuf },

    /// An external client failed; `output` is its own diagnostics
    #[error("Command failed ({reason}): {command}\n{output}")]
    ExternalProcess {
        /// Command line with secrets redacted
        command: String,
        reason: ProcessFailure,
        output: String,
    },

    /// Neither the director name nor the internal IP yields a target
    #[error("No usable director target: {key} is unreachable or undefined and {fallback_key} is undefined")]
    UnreachableTarget { key: String, fallback_key: String },

    /// A trust-chain certificate could not be extracted
    #[error("Failed to extract {key} from {path}")]
    Extraction { key: String, path: PathBuf },

    /// The credential-store login exchange failed
    #[error("Login to {target} failed ({reason})\n{output}")]
    Login {
        target: String,
        reason: ProcessFailure,
        output: String,
    },

    /// Invalid key path
    #[error("Invalid key path: {0:?}")]
    InvalidKey(String),

    /// Filesystem error from mantle-fs
    #[error(transparent)]
    Fs(mantle_fs::Error),

    /// Execution error from mantle-exec
    #[error(transparent)]
    Exec(mantle_exec::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Settings could not be merged into their typed form
    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EmptyFragmentSet { .. } => EXIT_SKIPPED,
            _ => 1,
        }
    }
}

impl From<mantle_fs::Error> for Error {
    fn from(err: mantle_fs::Error) -> Self {
        match err {
            mantle_fs::Error::NotFound { path } => Self::NotFound { path },
            other => Self::Fs(other),
        }
    }
}

impl From<mantle_exec::Error> for Error {
    fn from(err: mantle_exec::Error) -> Self {
        match err {
            mantle_exec::Error::TimedOut {
                command,
                timeout,
                output,
            } => Self::ExternalProcess {
                command,
                reason: ProcessFailure::TimedOut(timeout),
                output,
            },
            other => Self::Exec(other),
        }
    }
}
