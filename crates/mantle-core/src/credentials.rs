//! Session credential discovery
//!
//! Each session fact has its own fallback policy:
//!
//! - client id/secret: secrets document only, and only when an admin
//!   username is configured. A miss is logged as "no session defined".
//! - CA certificate: secrets document first, then every variable source.
//!   A miss is non-fatal.
//! - target address: the director name when it resolves *and* answers a
//!   reachability probe, otherwise the internal IP without a second probe.
//!   A miss on both is fatal for anything that needs a target.

use mantle_fs::{EnvironmentLayout, aggregate_variable_sources};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::search::lookup_in;
use crate::{
    Error, InterpolationEngine, ReachabilityProbe, Result, SessionEnvironment, SessionSettings,
    VariableSearchIndex,
};

pub struct SessionCredentialResolver<'a> {
    engine: &'a InterpolationEngine<'a>,
    probe: &'a dyn ReachabilityProbe,
    layout: &'a EnvironmentLayout,
    settings: &'a SessionSettings,
}

impl<'a> SessionCredentialResolver<'a> {
    pub fn new(
        engine: &'a InterpolationEngine<'a>,
        probe: &'a dyn ReachabilityProbe,
        layout: &'a EnvironmentLayout,
        settings: &'a SessionSettings,
    ) -> Self {
        Self {
            engine,
            probe,
            layout,
            settings,
        }
    }

    /// Recompute the session from scratch.
    ///
    /// `session` is cleared first. Client and CA results are kept even when
    /// target resolution fails with [`Error::UnreachableTarget`].
    pub fn resolve_into(&self, session: &mut SessionEnvironment) -> Result<()> {
        session.unset();
        let manages_client = !self.settings.admin_username.is_empty();
        session.set_manages_client(manages_client);

        let sources = aggregate_variable_sources(self.layout)?;
        debug!(count = sources.len(), "Aggregated variable sources");
        let index = VariableSearchIndex::new(self.engine, &sources);

        if manages_client {
            self.resolve_client(session)?;
        } else {
            debug!("No admin username configured, keeping the ambient client session");
        }
        self.resolve_ca(session, &index)?;
        self.resolve_target(session, &index)
    }

    fn resolve_client(&self, session: &mut SessionEnvironment) -> Result<()> {
        let key = self.settings.secret_key()?;
        let secrets = self.layout.secrets_file();
        match lookup_in(self.engine, &secrets, &key) {
            Ok(found) => {
                info!(
                    client = %self.settings.admin_username,
                    source = %found.source.display(),
                    "Using client credentials"
                );
                session.set_client(&self.settings.admin_username, SecretString::from(found.value));
                Ok(())
            }
            Err(Error::KeyNotFound { .. }) => {
                warn!(%key, secrets = %secrets.display(), "No session defined");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_ca(
        &self,
        session: &mut SessionEnvironment,
        index: &VariableSearchIndex<'_>,
    ) -> Result<()> {
        let key = &self.settings.ca_key;
        let found = match lookup_in(self.engine, &self.layout.secrets_file(), key) {
            Ok(found) => Some(found),
            Err(Error::KeyNotFound { .. }) => match index.find(key) {
                Ok(found) => Some(found),
                Err(Error::KeyNotFound { .. }) => None,
                Err(err) => return Err(err),
            },
            Err(err) => return Err(err),
        };

        match found {
            Some(found) => {
                info!(%key, source = %found.source.display(), "Using CA certificate");
                session.set_ca_certificate(found.value);
            }
            None => warn!(%key, "No CA certificate found, continuing without one"),
        }
        Ok(())
    }

    fn resolve_target(
        &self,
        session: &mut SessionEnvironment,
        index: &VariableSearchIndex<'_>,
    ) -> Result<()> {
        let name_key = &self.settings.director_name_key;
        let ip_key = &self.settings.internal_ip_key;

        let name = match index.find(name_key) {
            Ok(found) => Some(found.value),
            Err(Error::KeyNotFound { .. }) => None,
            Err(err) => return Err(err),
        };

        match name {
            Some(name) if self.probe.is_reachable(&name) => {
                info!(target = %name, "Using director name as target");
                session.set_target_address(name);
                return Ok(());
            }
            Some(name) => warn!(target = %name, "Director name unreachable, falling back to internal IP"),
            None => debug!(key = %name_key, "Director name undefined, falling back to internal IP"),
        }

        match index.find(ip_key) {
            Ok(found) => {
                info!(target = %found.value, "Using internal IP as target");
                session.set_target_address(found.value);
                Ok(())
            }
            Err(Error::KeyNotFound { .. }) => Err(Error::UnreachableTarget {
                key: name_key.to_string(),
                fallback_key: ip_key.to_string(),
            }),
            Err(err) => Err(err),
        }
    }
}
