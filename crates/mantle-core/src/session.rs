//! Session state for director and credential-store invocations
//!
//! The four session facts live in an explicit, caller-owned
//! [`SessionEnvironment`] rather than in the process environment. They are
//! handed to external commands through [`SessionEnvironment::export`].

use mantle_exec::{CommandRequest, Value};
use secrecy::{ExposeSecret, SecretString};

pub const ENV_CLIENT: &str = "BOSH_CLIENT";
pub const ENV_CLIENT_SECRET: &str = "BOSH_CLIENT_SECRET";
pub const ENV_CA_CERT: &str = "BOSH_CA_CERT";
pub const ENV_ENVIRONMENT: &str = "BOSH_ENVIRONMENT";

/// The facts needed to address the director.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub ca_certificate: Option<String>,
    pub target_address: Option<String>,
}

/// Session facts plus the policy for the client pair.
///
/// When no admin username is configured the environment does not manage
/// the client id/secret: exported commands inherit whatever the caller's
/// own environment holds ("bring your own session").
#[derive(Debug, Clone, Default)]
pub struct SessionEnvironment {
    credentials: SessionCredentials,
    manages_client: bool,
}

impl SessionEnvironment {
    pub fn new(manages_client: bool) -> Self {
        Self {
            credentials: SessionCredentials::default(),
            manages_client,
        }
    }

    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    pub fn manages_client(&self) -> bool {
        self.manages_client
    }

    pub fn set_manages_client(&mut self, manages_client: bool) {
        self.manages_client = manages_client;
    }

    /// Clear every field.
    pub fn unset(&mut self) {
        self.credentials = SessionCredentials::default();
    }

    pub fn set_client(&mut self, id: impl Into<String>, secret: SecretString) {
        self.credentials.client_id = Some(id.into());
        self.credentials.client_secret = Some(secret);
    }

    pub fn set_ca_certificate(&mut self, ca: impl Into<String>) {
        self.credentials.ca_certificate = Some(ca.into());
    }

    pub fn set_target_address(&mut self, target: impl Into<String>) {
        self.credentials.target_address = Some(target.into());
    }

    pub fn target_address(&self) -> Option<&str> {
        self.credentials.target_address.as_deref()
    }

    /// Resolved, non-empty fields as environment assignments.
    pub fn exported(&self) -> Vec<(&'static str, Value)> {
        let creds = &self.credentials;
        let mut vars = Vec::new();
        if let Some(id) = non_empty(creds.client_id.as_deref()) {
            vars.push((ENV_CLIENT, Value::from(id)));
        }
        if let Some(secret) = &creds.client_secret
            && !secret.expose_secret().is_empty()
        {
            vars.push((ENV_CLIENT_SECRET, Value::Secret(secret.clone())));
        }
        if let Some(ca) = non_empty(creds.ca_certificate.as_deref()) {
            vars.push((ENV_CA_CERT, Value::from(ca)));
        }
        if let Some(target) = non_empty(creds.target_address.as_deref()) {
            vars.push((ENV_ENVIRONMENT, Value::from(target)));
        }
        vars
    }

    /// Publish the session into a command's environment.
    ///
    /// Unresolved CA/target variables are removed so stale values from the
    /// caller's environment cannot leak in. Unresolved client variables are
    /// removed only when the client pair is managed.
    pub fn export(&self, mut request: CommandRequest) -> CommandRequest {
        let exported = self.exported();
        let is_set = |name: &str| exported.iter().any(|(n, _)| *n == name);

        let mut managed = vec![ENV_CA_CERT, ENV_ENVIRONMENT];
        if self.manages_client {
            managed.extend([ENV_CLIENT, ENV_CLIENT_SECRET]);
        }
        for name in managed {
            if !is_set(name) {
                request = request.env_remove(name);
            }
        }
        for (name, value) in exported {
            request = request.env(name, value);
        }
        request
    }

    /// Render the session as shell assignments.
    ///
    /// The client secret is redacted unless `reveal` is set.
    pub fn describe(&self, reveal: bool) -> String {
        self.exported()
            .into_iter()
            .map(|(name, value)| {
                let shown = if reveal && value.is_secret() {
                    Value::from(value.expose())
                } else {
                    value
                };
                format!("export {name}={shown}\n")
            })
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
