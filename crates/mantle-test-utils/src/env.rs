//! [`TestEnv`] builder for environment-root scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary environment root using the default layout.
///
/// # Example
///
/// ```rust,no_run
/// use mantle_test_utils::TestEnv;
///
/// let env = TestEnv::new();
/// env.operation("00-base.yml", "name: bosh\n");
/// env.variable("creds.yml", "internal_ip: 10.0.0.5\n");
/// env.assert_file_exists("operations/00-base.yml");
/// ```
pub struct TestEnv {
    temp_dir: TempDir,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `rel` under the root, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TestEnv::write: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestEnv::write: failed to write {}: {e}", path.display()));
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Fragment under `operations/`.
    pub fn operation(&self, name: &str, content: &str) -> PathBuf {
        self.write(&format!("operations/{name}"), content)
    }

    /// Document under `variables/`.
    pub fn variable(&self, name: &str, content: &str) -> PathBuf {
        self.write(&format!("variables/{name}"), content)
    }

    /// The dedicated secrets document (`state/creds.yml`).
    pub fn secrets(&self, content: &str) -> PathBuf {
        self.write("state/creds.yml", content)
    }

    /// The general settings document (`vars.yml`).
    pub fn settings(&self, content: &str) -> PathBuf {
        self.write("vars.yml", content)
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, rel: &str) {
        let full_path = self.root().join(rel);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, rel: &str) {
        let full_path = self.root().join(rel);
        assert!(
            !full_path.exists(),
            "Expected file to NOT exist: {}",
            full_path.display()
        );
    }
}
