//! Interpolation engine adapter
//!
//! Translates rendering and single-key extraction into structured
//! invocations of the external engine:
//!
//! ```text
//! <program> interpolate <base> [-o <overlay>]... [-l <vars>]... [-l <inline>] [--path <key>]
//! ```
//!
//! The inline document is passed last so it takes precedence over every
//! other variable file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mantle_exec::{CommandOutput, CommandRequest, CommandRunner};
use tracing::debug;

use crate::error::ProcessFailure;
use crate::{Error, KeyPath, Result};

/// A composed interpolation instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpolationRequest {
    pub base: PathBuf,
    /// Applied on top of `base` in order
    pub overlays: Vec<PathBuf>,
    pub var_files: Vec<PathBuf>,
    /// Highest-precedence inline variables document
    pub inline_vars: Option<PathBuf>,
    /// Extraction-only mode
    pub path: Option<KeyPath>,
}

impl InterpolationRequest {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }
}

/// The external interpolation engine.
pub struct InterpolationEngine<'a> {
    runner: &'a dyn CommandRunner,
    program: String,
    timeout: Option<Duration>,
}

impl<'a> InterpolationEngine<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self, request: &InterpolationRequest) -> CommandRequest {
        let mut command = CommandRequest::new(&self.program)
            .arg("interpolate")
            .arg(&request.base)
            .maybe_timeout(self.timeout);
        for overlay in &request.overlays {
            command = command.opt("-o", overlay);
        }
        for vars in &request.var_files {
            command = command.opt("-l", vars);
        }
        if let Some(inline) = &request.inline_vars {
            command = command.opt("-l", inline);
        }
        if let Some(path) = &request.path {
            command = command.opt("--path", path.as_str());
        }
        command
    }

    /// Run the engine; the exit status is left for the caller to judge.
    pub fn run(&self, request: &InterpolationRequest) -> Result<(CommandRequest, CommandOutput)> {
        let command = self.command(request);
        let output = self.runner.run(&command)?;
        Ok((command, output))
    }

    /// Extract a single key from one document.
    ///
    /// `Ok(None)` means the document does not define the key (the engine
    /// exited non-zero). Spawn failures and timeouts are errors.
    pub fn extract(&self, source: &Path, key: &KeyPath) -> Result<Option<String>> {
        let request = InterpolationRequest {
            path: Some(key.clone()),
            ..InterpolationRequest::new(source)
        };
        let (_, output) = self.run(&request)?;
        if !output.success() {
            debug!(source = %source.display(), %key, code = ?output.code, "Key not defined in source");
            return Ok(None);
        }
        Ok(Some(strip_newline(output.stdout_text().into_owned())))
    }
}

/// Turn a failed run into [`Error::ExternalProcess`].
pub fn ensure_success(command: &CommandRequest, output: CommandOutput) -> Result<CommandOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(Error::ExternalProcess {
            command: command.to_string(),
            reason: ProcessFailure::Exit(output.code),
            output: output.combined(),
        })
    }
}

fn strip_newline(mut value: String) -> String {
    if value.ends_with('\n') {
        value.pop();
        if value.ends_with('\r') {
            value.pop();
        }
    }
    value
}
