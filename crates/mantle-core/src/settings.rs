//! Layered settings
//!
//! Settings are resolved from a hierarchy of sources, later sources
//! overriding earlier ones with deep merging of tables:
//! 1. Built-in defaults
//! 2. User config (`<config dir>/mantle/config.toml`)
//! 3. Environment config (`<root>/mantle.toml`, or an explicit file)
//!
//! Command-line overrides are applied by the caller on the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mantle_fs::{ConfigStore, LayoutConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Error, KeyPath, Result};

/// Environment config file name, relative to the root.
pub const CONFIG_FILE: &str = "mantle.toml";

/// Fully resolved settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutConfig,
    pub session: SessionSettings,
    pub credential_store: CredentialStoreSettings,
    pub tools: ToolSettings,
    pub logging: LoggingSettings,
}

/// Well-known keys and policy for session discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Empty means "bring your own session": client id/secret are not touched
    pub admin_username: String,
    /// Name of the client secret in the secrets document
    pub secret_name: String,
    pub ca_key: KeyPath,
    pub director_name_key: KeyPath,
    pub internal_ip_key: KeyPath,
    pub director_port: u16,
    pub probe_timeout_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            secret_name: "admin_password".to_string(),
            ca_key: KeyPath::from_static("/director_ssl/ca"),
            director_name_key: KeyPath::from_static("/director_name"),
            internal_ip_key: KeyPath::from_static("/internal_ip"),
            director_port: 25555,
            probe_timeout_secs: 5,
        }
    }
}

impl SessionSettings {
    /// Key of the client secret, derived from `secret_name`.
    pub fn secret_key(&self) -> Result<KeyPath> {
        KeyPath::new(&self.secret_name)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Credential-store login parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialStoreSettings {
    pub username: String,
    /// Login secret, looked up in the secrets document only
    pub secret_key: KeyPath,
    pub uaa_ca_key: KeyPath,
    pub tls_ca_key: KeyPath,
    pub port: u16,
}

impl Default for CredentialStoreSettings {
    fn default() -> Self {
        Self {
            username: "credhub-admin".to_string(),
            secret_key: KeyPath::from_static("/credhub_admin_client_secret"),
            uaa_ca_key: KeyPath::from_static("/uaa_ssl/ca"),
            tls_ca_key: KeyPath::from_static("/credhub_tls/ca"),
            port: 8844,
        }
    }
}

/// External client programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub interpolator: String,
    pub director: String,
    pub credential_store: String,
    /// Per-invocation timeout; 0 disables it
    pub timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            interpolator: "bosh".to_string(),
            director: "bosh".to_string(),
            credential_store: "credhub".to_string(),
            timeout_secs: 3600,
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Durable log file, relative to the root; `None` disables it
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("logs/mantle.log")),
        }
    }
}

/// Resolves [`Settings`] for an environment root.
pub struct SettingsResolver {
    root: PathBuf,
    config_file: Option<PathBuf>,
    /// Override for the user config directory (used for testing)
    global_config_dir_override: Option<PathBuf>,
}

impl SettingsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_file: None,
            global_config_dir_override: None,
        }
    }

    /// Use an explicit environment config file instead of `<root>/mantle.toml`.
    ///
    /// Unlike the default location, an explicit file must exist.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_global_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_config_dir_override = Some(dir.into());
        self
    }

    fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir_override
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join("mantle")))
            .map(|dir| dir.join("config.toml"))
    }

    pub fn resolve(&self) -> Result<Settings> {
        let store = ConfigStore::new();
        let mut merged = serde_json::to_value(Settings::default())?;

        if let Some(global) = self.global_config_path() {
            merge_layer(&store, &mut merged, &global)?;
        }

        match &self.config_file {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(Error::NotFound {
                        path: explicit.clone(),
                    });
                }
                merge_layer(&store, &mut merged, explicit)?;
            }
            None => merge_layer(&store, &mut merged, &self.root.join(CONFIG_FILE))?,
        }

        Ok(serde_json::from_value(merged)?)
    }
}

fn merge_layer(store: &ConfigStore, merged: &mut Value, path: &Path) -> Result<()> {
    if let Some(layer) = store.load_optional::<Value>(path)? {
        debug!(path = %path.display(), "Merging settings layer");
        deep_merge(merged, layer);
    }
    Ok(())
}

/// Deep merge `overlay` into `base`; objects merge key by key, anything else replaces.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
