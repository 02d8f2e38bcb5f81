//! External command execution for mantle
//!
//! Every call to an external client (interpolation engine, director,
//! credential store) is described as a [`CommandRequest`]: a program, a
//! typed argument list, environment changes and a timeout. Requests never
//! pass through a shell, and secret arguments render as `<redacted>` when
//! displayed or logged.
//!
//! Execution goes through the [`CommandRunner`] port so callers can be
//! exercised against a substitute runner.

pub mod error;
pub mod request;
pub mod runner;

pub use error::{Error, Result};
pub use request::{CommandRequest, Value};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
