//! Fragment discovery
//!
//! Lists the structured documents under a directory in a stable order.
//! Ordering is a plain byte-wise comparison of the full path string, so
//! precedence between fragments is encoded entirely by their names
//! (`00-base.yml`, `10-network.yml`, ...). Directory nesting carries no
//! precedence of its own: `a/z.yml` sorts after `a-b.yml` because `/`
//! is greater than `-`.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Default extensions treated as fragments.
pub const DEFAULT_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// A discovered fragment document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentFile {
    /// Absolute path of the document (symlinks are not rewritten).
    pub path: PathBuf,
    /// Position in the resolved order, starting at 0.
    pub rank: usize,
}

impl FragmentFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Filename filter for fragment discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentFilter {
    extensions: Vec<String>,
}

impl Default for FragmentFilter {
    fn default() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl FragmentFilter {
    /// Build a filter accepting the given extensions (without the leading dot).
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether the file name of `path` carries an accepted extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|accepted| *accepted == ext)
            })
            .unwrap_or(false)
    }
}

/// Resolves the ordered set of fragment files under a directory.
#[derive(Debug, Clone, Default)]
pub struct FileSetResolver {
    filter: FragmentFilter,
}

impl FileSetResolver {
    pub fn new(filter: FragmentFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &FragmentFilter {
        &self.filter
    }

    /// Resolve fragments under a directory that must exist.
    ///
    /// Returns [`Error::NotFound`] when `dir` is missing or not a directory.
    /// An existing directory without matching files yields an empty list.
    pub fn resolve(&self, dir: &Path) -> Result<Vec<FragmentFile>> {
        if !dir.is_dir() {
            return Err(Error::NotFound {
                path: dir.to_path_buf(),
            });
        }
        self.walk(dir)
    }

    /// Resolve fragments under a directory that may be absent.
    ///
    /// A missing directory is treated as empty.
    pub fn resolve_optional(&self, dir: &Path) -> Result<Vec<FragmentFile>> {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Optional fragment directory absent");
            return Ok(Vec::new());
        }
        self.walk(dir)
    }

    fn walk(&self, dir: &Path) -> Result<Vec<FragmentFile>> {
        let root = std::path::absolute(dir).map_err(|e| Error::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in WalkDir::new(&root).min_depth(1).follow_links(true) {
            // Broken symlinks and symlink loops surface as walk errors.
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "Skipping unreadable fragment entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.filter.matches(entry.path()) {
                continue;
            }
            paths.push(entry.into_path());
        }

        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        debug!(dir = %root.display(), count = paths.len(), "Resolved fragments");
        Ok(paths
            .into_iter()
            .enumerate()
            .map(|(rank, path)| FragmentFile { path, rank })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_yaml_extensions() {
        let filter = FragmentFilter::default();
        assert!(filter.matches(Path::new("ops/00-base.yml")));
        assert!(filter.matches(Path::new("ops/10-net.YAML")));
        assert!(!filter.matches(Path::new("ops/README.md")));
        assert!(!filter.matches(Path::new("ops/yml")));
    }

    #[test]
    fn filter_strips_leading_dots() {
        let filter = FragmentFilter::with_extensions([".json"]);
        assert!(filter.matches(Path::new("vars.json")));
        assert!(!filter.matches(Path::new("vars.yml")));
    }

    #[test]
    fn resolve_missing_directory_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("operations");

        let err = FileSetResolver::default().resolve(&missing).unwrap_err();
        assert!(matches!(err, Error::NotFound { path } if path == missing));
    }

    #[test]
    fn resolve_optional_missing_directory_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let found = FileSetResolver::default()
            .resolve_optional(&temp.path().join("variables"))
            .unwrap();
        assert!(found.is_empty());
    }
}
