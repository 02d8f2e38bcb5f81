//! Deployment director client
//!
//! Every invocation carries the exported [`SessionEnvironment`].

use std::fmt;
use std::path::Path;
use std::time::Duration;

use mantle_exec::{CommandOutput, CommandRequest, CommandRunner};
use serde::Serialize;
use tracing::info;

use crate::engine::ensure_success;
use crate::{Result, SessionEnvironment};

/// What to do with a rendered manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorAction {
    /// Resolve the manifest against the vars store without deploying
    Render,
    CreateOrUpdate,
    Delete,
}

impl DirectorAction {
    fn subcommand(self) -> &'static str {
        match self {
            Self::Render => "interpolate",
            Self::CreateOrUpdate => "create-env",
            Self::Delete => "delete-env",
        }
    }
}

impl fmt::Display for DirectorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subcommand())
    }
}

/// Fields of the director's `env` report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub name: Option<String>,
    pub uuid: Option<String>,
    pub cpi: Option<String>,
}

impl EnvironmentInfo {
    /// Pick `Name`, `UUID` and `CPI` out of the report.
    ///
    /// Each field is the second whitespace-separated word of the first line
    /// starting with its label.
    pub fn parse(report: &str) -> Self {
        let field = |label: &str| {
            report.lines().find_map(|line| {
                let mut words = line.split_whitespace();
                (words.next() == Some(label))
                    .then(|| words.next())
                    .flatten()
                    .map(str::to_string)
            })
        };
        Self {
            name: field("Name"),
            uuid: field("UUID"),
            cpi: field("CPI"),
        }
    }
}

pub struct DirectorClient<'a> {
    runner: &'a dyn CommandRunner,
    session: &'a SessionEnvironment,
    program: String,
    timeout: Option<Duration>,
}

impl<'a> DirectorClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, session: &'a SessionEnvironment) -> Self {
        Self {
            runner,
            session,
            program: "bosh".to_string(),
            timeout: None,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, subcommand: &str) -> CommandRequest {
        self.session.export(
            CommandRequest::new(&self.program)
                .arg(subcommand)
                .maybe_timeout(self.timeout),
        )
    }

    fn execute(&self, command: CommandRequest) -> Result<CommandOutput> {
        info!(%command, "Running director command");
        let output = self.runner.run(&command)?;
        ensure_success(&command, output)
    }

    /// Apply `action` to a manifest with its persisted run state.
    pub fn apply(
        &self,
        action: DirectorAction,
        manifest: &Path,
        state: &Path,
        vars_store: &Path,
    ) -> Result<CommandOutput> {
        let command = self.command(action.subcommand()).arg(manifest);
        let command = match action {
            DirectorAction::Render => command.opt("--vars-store", vars_store),
            DirectorAction::CreateOrUpdate | DirectorAction::Delete => command
                .opt("--state", state)
                .opt("--vars-store", vars_store),
        };
        let output = self.execute(command)?;
        info!(%action, manifest = %manifest.display(), "Director action completed");
        Ok(output)
    }

    /// Query the current environment.
    pub fn environment(&self) -> Result<EnvironmentInfo> {
        let output = self.execute(self.command("env"))?;
        Ok(EnvironmentInfo::parse(&output.stdout_text()))
    }

    pub fn update_cloud_config(&self, manifest: &Path) -> Result<CommandOutput> {
        self.execute(self.command("update-cloud-config").arg("-n").arg(manifest))
    }

    /// Upload a runtime config; `None` updates the director's default one.
    pub fn update_runtime_config(
        &self,
        name: Option<&str>,
        manifest: &Path,
    ) -> Result<CommandOutput> {
        let mut command = self.command("update-runtime-config").arg("-n");
        if let Some(name) = name {
            command = command.opt("--name", name);
        }
        self.execute(command.arg(manifest))
    }
}
