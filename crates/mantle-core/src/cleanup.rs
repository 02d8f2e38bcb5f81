//! Scoped temporary files
//!
//! Every temporary file is created through a [`CleanupRegistry`] and handed
//! out as a [`ScopedTempFile`]. Dropping the handle deletes the file and
//! deregisters it. Files still registered when a termination signal arrives
//! are removed by [`CleanupRegistry::purge`].

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tempfile::TempPath;
use tracing::{debug, warn};

use crate::Result;

/// Tracks live temporary files; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct CleanupRegistry {
    paths: Arc<Mutex<BTreeSet<PathBuf>>>,
    /// Parent directory for new files; the system temp dir when `None`
    dir: Option<PathBuf>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create files under `dir` instead of the system temp dir.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: Arc::default(),
            dir: Some(dir.into()),
        }
    }

    /// Create a uniquely named file holding `contents`.
    pub fn create(&self, prefix: &str, contents: &str) -> Result<ScopedTempFile> {
        self.create_with_suffix(prefix, ".tmp", contents)
    }

    /// Create a uniquely named file holding `contents`, ending in `suffix`.
    pub fn create_with_suffix(
        &self,
        prefix: &str,
        suffix: &str,
        contents: &str,
    ) -> Result<ScopedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).suffix(suffix);
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(contents.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        self.lock().insert(path.to_path_buf());
        debug!(path = %path.display(), "Created temporary file");
        Ok(ScopedTempFile {
            path,
            registry: self.clone(),
        })
    }

    /// Paths currently registered.
    pub fn registered(&self) -> Vec<PathBuf> {
        self.lock().iter().cloned().collect()
    }

    /// Remove every registered file; returns how many were deleted.
    ///
    /// Called from the signal handler, so failures are only logged.
    pub fn purge(&self) -> usize {
        let paths = std::mem::take(&mut *self.lock());
        let mut removed = 0;
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!(path = %path.display(), error = %err, "Failed to remove temporary file"),
            }
        }
        removed
    }

    fn release(&self, path: &Path) {
        self.lock().remove(path);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A temporary file deleted when dropped.
#[derive(Debug)]
pub struct ScopedTempFile {
    path: TempPath,
    registry: CleanupRegistry,
}

impl ScopedTempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedTempFile {
    fn drop(&mut self) {
        self.registry.release(&self.path);
        debug!(path = %self.path.display(), "Removing temporary file");
        // TempPath deletes the file when it drops after this
    }
}

/// Where a rendered manifest lands.
#[derive(Debug)]
pub enum ManifestDestination {
    /// Caller-supplied; persists after the run
    Explicit(PathBuf),
    /// Process-scoped; removed on drop or by the signal handler
    Temporary(ScopedTempFile),
}

impl ManifestDestination {
    pub fn resolve(explicit: Option<PathBuf>, registry: &CleanupRegistry) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::Explicit(path)),
            None => Ok(Self::Temporary(registry.create_with_suffix(
                "manifest-",
                ".yml",
                "",
            )?)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) => path,
            Self::Temporary(file) => file.path(),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}
