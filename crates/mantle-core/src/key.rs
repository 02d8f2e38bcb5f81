//! Slash-delimited key paths into variable documents

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A key path such as `/director_ssl/ca`.
///
/// A missing leading `/` is added; empty paths and empty segments are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyPath(String);

impl KeyPath {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref().trim();
        let body = raw.strip_prefix('/').unwrap_or(raw);
        if body.is_empty() || body.split('/').any(str::is_empty) {
            return Err(Error::InvalidKey(raw.to_string()));
        }
        Ok(Self(format!("/{body}")))
    }

    /// Key paths baked into defaults.
    pub(crate) fn from_static(path: &'static str) -> Self {
        debug_assert!(path.starts_with('/'));
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for KeyPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<KeyPath> for String {
    fn from(key: KeyPath) -> Self {
        key.0
    }
}
