//! Credential-store login
//!
//! The login exchange needs two trust chains (the UAA CA and the store's
//! own TLS CA) as files on disk. They are written to scoped temporary files
//! that are gone by the time [`CredentialStoreBootstrapper::login`]
//! returns, whichever way it returns.

use std::path::Path;
use std::time::Duration;

use mantle_exec::{CommandRequest, CommandRunner};
use mantle_fs::EnvironmentLayout;
use secrecy::SecretString;
use tracing::{error, info};

use crate::error::ProcessFailure;
use crate::search::lookup_in;
use crate::{CleanupRegistry, Error, InterpolationEngine, KeyPath, Result, ScopedTempFile};

/// Client name variable read by the store client
const CLIENT_VAR: &str = "CREDHUB_CLIENT";
/// Client secret variable read by the store client
const SECRET_VAR: &str = "CREDHUB_SECRET";

/// Base URL of the credential store on `target`.
pub fn credhub_url(target: &str, port: u16) -> String {
    format!("https://{target}:{port}")
}

/// Keys of the two trust chains in the secrets document.
#[derive(Debug, Clone)]
pub struct TrustChainKeys {
    pub uaa_ca: KeyPath,
    pub tls_ca: KeyPath,
}

pub struct CredentialStoreBootstrapper<'a> {
    engine: &'a InterpolationEngine<'a>,
    runner: &'a dyn CommandRunner,
    registry: &'a CleanupRegistry,
    layout: &'a EnvironmentLayout,
    trust_chain: TrustChainKeys,
    program: String,
    timeout: Option<Duration>,
}

impl<'a> CredentialStoreBootstrapper<'a> {
    pub fn new(
        engine: &'a InterpolationEngine<'a>,
        runner: &'a dyn CommandRunner,
        registry: &'a CleanupRegistry,
        layout: &'a EnvironmentLayout,
        trust_chain: TrustChainKeys,
    ) -> Self {
        Self {
            engine,
            runner,
            registry,
            layout,
            trust_chain,
            program: "credhub".to_string(),
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

    /// Log in to the store at `target_url` as `username`.
    ///
    /// The secret is read from the secrets document at `secret_key` only.
    /// The client identity reaches the store client through its environment
    /// (`CREDHUB_CLIENT`, `CREDHUB_SECRET`), never its argument list, so the
    /// secret stays out of the process table and the logs.
    pub fn login(&self, target_url: &str, username: &str, secret_key: &KeyPath) -> Result<()> {
        let secrets = self.layout.secrets_file();

        let uaa_ca = self.trust_chain_file(&secrets, &self.trust_chain.uaa_ca, "uaa-ca-")?;
        let tls_ca = self.trust_chain_file(&secrets, &self.trust_chain.tls_ca, "credstore-ca-")?;

        let secret = match lookup_in(self.engine, &secrets, secret_key) {
            Ok(found) => SecretString::from(found.value),
            Err(Error::KeyNotFound { .. }) => {
                error!(key = %secret_key, secrets = %secrets.display(), "Login secret not found");
                return Err(Error::SecretNotFound {
                    key: secret_key.to_string(),
                    path: secrets,
                });
            }
            Err(err) => return Err(err),
        };

        let command = CommandRequest::new(&self.program)
            .arg("login")
            .opt("-s", target_url)
            .opt("--ca-cert", uaa_ca.path())
            .opt("--ca-cert", tls_ca.path())
            .env(CLIENT_VAR, username)
            .env(SECRET_VAR, secret)
            .maybe_timeout(self.timeout);
        info!(%command, "Logging in to credential store");

        let output = self.runner.run(&command).map_err(|err| match Error::from(err) {
            Error::ExternalProcess { reason, output, .. } => Error::Login {
                target: target_url.to_string(),
                reason,
                output,
            },
            other => other,
        })?;

        if !output.success() {
            error!(target = target_url, code = ?output.code, "Credential store login failed");
            return Err(Error::Login {
                target: target_url.to_string(),
                reason: ProcessFailure::Exit(output.code),
                output: output.combined(),
            });
        }

        info!(target = target_url, user = username, "Logged in to credential store");
        Ok(())
    }

    fn trust_chain_file(
        &self,
        secrets: &Path,
        key: &KeyPath,
        prefix: &str,
    ) -> Result<ScopedTempFile> {
        match lookup_in(self.engine, secrets, key) {
            Ok(found) => self.registry.create(prefix, &found.value),
            Err(Error::KeyNotFound { .. }) => {
                error!(%key, secrets = %secrets.display(), "Trust chain not found");
                Err(Error::Extraction {
                    key: key.to_string(),
                    path: secrets.to_path_buf(),
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_https_and_port() {
        assert_eq!(credhub_url("10.0.0.5", 8844), "https://10.0.0.5:8844");
        assert_eq!(
            credhub_url("bosh.lab.example", 9000),
            "https://bosh.lab.example:9000"
        );
    }
}
