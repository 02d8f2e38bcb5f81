//! Variable lookup across ordered sources
//!
//! [`VariableSearchIndex`] probes sources in order and stops at the first
//! one defining the key. Later sources are never consulted, so two sources
//! defining the same key are not reported as a conflict.

use std::path::{Path, PathBuf};

use mantle_fs::VariableSource;
use tracing::{debug, info};

use crate::{Error, InterpolationEngine, KeyPath, Result};

/// Which source satisfied a lookup, and the value it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSearchResult {
    pub source: PathBuf,
    pub value: String,
}

/// First-match lookup over an ordered list of variable sources.
pub struct VariableSearchIndex<'a> {
    engine: &'a InterpolationEngine<'a>,
    sources: &'a [VariableSource],
}

impl<'a> VariableSearchIndex<'a> {
    pub fn new(engine: &'a InterpolationEngine<'a>, sources: &'a [VariableSource]) -> Self {
        Self { engine, sources }
    }

    /// Find the first source defining `key`.
    pub fn find(&self, key: &KeyPath) -> Result<VariableSearchResult> {
        for source in self.sources {
            if let Some(value) = self.engine.extract(source.path(), key)? {
                info!(%key, source = %source.path().display(), "Resolved variable");
                return Ok(VariableSearchResult {
                    source: source.path.clone(),
                    value,
                });
            }
        }
        debug!(%key, searched = self.sources.len(), "Variable not defined in any source");
        Err(Error::KeyNotFound {
            key: key.to_string(),
            searched: self.sources.len(),
        })
    }
}

/// Look `key` up in a single document.
///
/// A missing document is treated like a document without the key, without
/// invoking the engine.
pub fn lookup_in(
    engine: &InterpolationEngine<'_>,
    document: &Path,
    key: &KeyPath,
) -> Result<VariableSearchResult> {
    let not_found = || Error::KeyNotFound {
        key: key.to_string(),
        searched: 1,
    };

    if !document.is_file() {
        debug!(document = %document.display(), %key, "Lookup document absent");
        return Err(not_found());
    }

    match engine.extract(document, key)? {
        Some(value) => {
            info!(%key, source = %document.display(), "Resolved variable");
            Ok(VariableSearchResult {
                source: document.to_path_buf(),
                value,
            })
        }
        None => Err(not_found()),
    }
}
