//! Per-invocation environment context
//!
//! Resolves the environment root and its settings once, and hands out the
//! collaborators commands need: the interpolation engine, the director
//! client settings and a resolved session.

use std::path::PathBuf;

use mantle_core::{
    CleanupRegistry, DirectorClient, EnvironmentLayout, Error, InterpolationEngine,
    SessionCredentialResolver, SessionEnvironment, Settings, SettingsResolver, TcpProbe,
};
use mantle_exec::SystemRunner;
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::error::Result;

/// Exit status after a termination signal.
const EXIT_INTERRUPTED: i32 = 130;

pub struct Context {
    pub settings: Settings,
    pub layout: EnvironmentLayout,
    pub runner: SystemRunner,
    pub registry: CleanupRegistry,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        if !cli.root.is_dir() {
            return Err(Error::NotFound {
                path: cli.root.clone(),
            }
            .into());
        }
        let root = std::path::absolute(&cli.root)?;

        let mut resolver = SettingsResolver::new(&root);
        if let Some(config) = &cli.config {
            resolver = resolver.with_config_file(config);
        }
        let mut settings = resolver.resolve()?;
        if let Some(admin) = &cli.admin_username {
            settings.session.admin_username = admin.clone();
        }

        let layout = EnvironmentLayout::new(&root, settings.layout.clone());
        Ok(Self {
            settings,
            layout,
            runner: SystemRunner::new(),
            registry: CleanupRegistry::new(),
        })
    }

    /// Durable log file, if enabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.settings
            .logging
            .file
            .as_ref()
            .map(|file| self.layout.root().join(file))
    }

    /// On SIGINT/SIGTERM kill running external commands and remove
    /// outstanding temporary files before exiting.
    ///
    /// Children run in their own process groups and do not see the
    /// terminal's interrupt themselves.
    pub fn install_signal_handler(&self) -> Result<()> {
        let registry = self.registry.clone();
        let runner = self.runner.clone();
        ctrlc::set_handler(move || {
            let killed = runner.terminate_all();
            let removed = registry.purge();
            warn!(killed, removed, "Interrupted, stopped commands and removed temporary files");
            std::process::exit(EXIT_INTERRUPTED);
        })?;
        Ok(())
    }

    pub fn engine(&self) -> InterpolationEngine<'_> {
        InterpolationEngine::new(&self.runner, &self.settings.tools.interpolator)
            .with_timeout(self.settings.tools.timeout())
    }

    pub fn director<'a>(&'a self, session: &'a SessionEnvironment) -> DirectorClient<'a> {
        DirectorClient::new(&self.runner, session)
            .with_program(&self.settings.tools.director)
            .with_timeout(self.settings.tools.timeout())
    }

    /// Resolve the session; a missing target is only logged.
    pub fn session(&self, engine: &InterpolationEngine<'_>) -> Result<SessionEnvironment> {
        let mut session = SessionEnvironment::default();
        match self.resolve_into(engine, &mut session) {
            Ok(()) => {}
            Err(err @ Error::UnreachableTarget { .. }) => {
                warn!(error = %err, "Continuing without a director target");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(session)
    }

    /// Resolve the session; a missing target is an error.
    pub fn targeted_session(&self, engine: &InterpolationEngine<'_>) -> Result<SessionEnvironment> {
        let mut session = SessionEnvironment::default();
        self.resolve_into(engine, &mut session)?;
        Ok(session)
    }

    fn resolve_into(
        &self,
        engine: &InterpolationEngine<'_>,
        session: &mut SessionEnvironment,
    ) -> mantle_core::Result<()> {
        let session_settings = &self.settings.session;
        let probe = TcpProbe::new(session_settings.director_port, session_settings.probe_timeout());
        debug!(root = %self.layout.root().display(), "Resolving session");
        SessionCredentialResolver::new(engine, &probe, &self.layout, session_settings)
            .resolve_into(session)
    }
}
