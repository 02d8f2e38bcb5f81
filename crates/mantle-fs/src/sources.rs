//! Variable source aggregation
//!
//! Variable sources are consulted in a fixed order: every document under
//! the variables directory (lexicographic), then the explicitly configured
//! documents (secrets, then general settings). Lookups stop at the first
//! source that defines a key.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{EnvironmentLayout, FileSetResolver, Result};

/// Where a variable source was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Discovered under the variables directory
    Directory,
    /// One of the explicitly configured documents
    Configured,
}

/// A document supplying key/value bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSource {
    pub path: PathBuf,
    pub provenance: Provenance,
}

impl VariableSource {
    pub fn new(path: impl Into<PathBuf>, provenance: Provenance) -> Self {
        Self {
            path: path.into(),
            provenance,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Build the ordered variable source list for an environment.
///
/// A missing variables directory contributes nothing, and configured
/// documents that do not exist are skipped.
pub fn aggregate_variable_sources(layout: &EnvironmentLayout) -> Result<Vec<VariableSource>> {
    let resolver = FileSetResolver::new(layout.fragment_filter());

    let mut sources: Vec<VariableSource> = resolver
        .resolve_optional(&layout.variables_dir())?
        .into_iter()
        .map(|fragment| VariableSource::new(fragment.path, Provenance::Directory))
        .collect();

    for path in layout.configured_sources() {
        if path.is_file() {
            sources.push(VariableSource::new(path, Provenance::Configured));
        } else {
            debug!(path = %path.display(), "Configured variable source absent, skipping");
        }
    }

    Ok(sources)
}
