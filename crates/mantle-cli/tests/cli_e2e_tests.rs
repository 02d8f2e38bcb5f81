//! CLI end-to-end tests that invoke the compiled `mantle` binary.
//!
//! External clients are replaced by an `sh` script: with the interpolator
//! configured as `sh`, the engine call `sh interpolate <base> ...` runs the
//! `interpolate` script in the environment root.

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// `mantle` with the log file disabled, run inside `root`.
fn mantle(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mantle").unwrap();
    cmd.current_dir(root.path())
        .env_remove("MANTLE_ROOT")
        .env_remove("MANTLE_CONFIG")
        .env_remove("MANTLE_ADMIN_USERNAME")
        .env_remove("RUST_LOG")
        .arg("--no-log-file");
    cmd
}

/// Configure `sh` as the interpolator with a script echoing the base fragment.
#[cfg(unix)]
fn fake_interpolator(root: &TempDir) {
    root.child("mantle.toml")
        .write_str("[tools]\ninterpolator = \"sh\"\n")
        .unwrap();
    root.child("interpolate").write_str("cat \"$1\"\n").unwrap();
}

#[test]
fn test_help_exits_zero() {
    let root = TempDir::new().unwrap();
    mantle(&root)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("interpolate"))
        .stdout(predicate::str::contains("session"));
}

#[test]
fn test_empty_operations_directory_exits_ten() {
    let root = TempDir::new().unwrap();
    root.child("operations").create_dir_all().unwrap();
    root.child("operations/notes.txt").write_str("not a fragment").unwrap();

    mantle(&root).arg("interpolate").assert().code(10).stdout("");
}

#[test]
fn test_missing_operations_directory_is_a_failure() {
    let root = TempDir::new().unwrap();
    mantle(&root)
        .arg("interpolate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("operations"));
}

#[test]
fn test_missing_optional_set_exits_ten() {
    let root = TempDir::new().unwrap();
    mantle(&root)
        .args(["interpolate", "--set", "runtime-config"])
        .assert()
        .code(10);
}

#[test]
fn test_missing_root_is_a_failure() {
    let root = TempDir::new().unwrap();
    mantle(&root)
        .args(["--root", "does-not-exist", "session"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn test_session_without_target_still_exits_zero() {
    let root = TempDir::new().unwrap();
    mantle(&root)
        .args(["session", "--admin-username", ""])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_status_without_target_fails() {
    let root = TempDir::new().unwrap();
    mantle(&root)
        .args(["status", "--admin-username", ""])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("/internal_ip"));
}

#[test]
#[cfg(unix)]
fn test_interpolate_writes_output_file() {
    let root = TempDir::new().unwrap();
    fake_interpolator(&root);
    root.child("operations/00-base.yml")
        .write_str("name: bosh\n")
        .unwrap();

    mantle(&root)
        .args(["interpolate", "-o", "manifest.yml"])
        .assert()
        .success()
        .stdout("");

    root.child("manifest.yml").assert("name: bosh\n");
}

#[test]
#[cfg(unix)]
fn test_interpolate_prints_manifest_without_output_file() {
    let root = TempDir::new().unwrap();
    fake_interpolator(&root);
    root.child("operations/00-base.yml")
        .write_str("name: bosh\n")
        .unwrap();

    mantle(&root)
        .arg("interpolate")
        .assert()
        .success()
        .stdout("name: bosh\n");
}

#[test]
#[cfg(unix)]
fn test_interpolate_engine_failure_keeps_previous_output() {
    let root = TempDir::new().unwrap();
    root.child("mantle.toml")
        .write_str("[tools]\ninterpolator = \"sh\"\n")
        .unwrap();
    root.child("interpolate")
        .write_str("echo 'Expected to find variables: internal_ip' >&2\nexit 1\n")
        .unwrap();
    root.child("operations/00-base.yml")
        .write_str("name: bosh\n")
        .unwrap();
    root.child("manifest.yml").write_str("previous\n").unwrap();

    mantle(&root)
        .args(["interpolate", "-o", "manifest.yml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("internal_ip"));

    root.child("manifest.yml").assert("previous\n");
}

#[test]
fn test_log_file_is_written_by_default() {
    let root = TempDir::new().unwrap();
    root.child("operations").create_dir_all().unwrap();

    Command::cargo_bin("mantle")
        .unwrap()
        .current_dir(root.path())
        .env_remove("MANTLE_ROOT")
        .env_remove("MANTLE_CONFIG")
        .arg("interpolate")
        .assert()
        .code(10);

    root.child("logs/mantle.log")
        .assert(predicate::str::contains("No fragments found"));
}
