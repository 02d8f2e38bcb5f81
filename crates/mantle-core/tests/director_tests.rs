use std::path::Path;

use mantle_core::session::{ENV_CLIENT_SECRET, ENV_ENVIRONMENT};
use mantle_core::{DirectorAction, DirectorClient, Error, SessionEnvironment};
use mantle_test_utils::FakeToolchain;
use pretty_assertions::assert_eq;
use rstest::rstest;
use secrecy::SecretString;

fn session() -> SessionEnvironment {
    let mut session = SessionEnvironment::new(true);
    session.set_client("admin", SecretString::from("s3cret"));
    session.set_target_address("10.0.0.5");
    session
}

#[rstest]
#[case::create(DirectorAction::CreateOrUpdate, "create-env", true)]
#[case::delete(DirectorAction::Delete, "delete-env", true)]
#[case::render(DirectorAction::Render, "interpolate", false)]
fn test_apply_passes_state_and_vars_store(
    #[case] action: DirectorAction,
    #[case] subcommand: &str,
    #[case] with_state: bool,
) {
    let toolchain = FakeToolchain::new();
    let session = session();
    let client = DirectorClient::new(&toolchain, &session);
    let manifest = tempfile::NamedTempFile::new().unwrap();

    client
        .apply(
            action,
            manifest.path(),
            Path::new("state/state.json"),
            Path::new("state/creds.yml"),
        )
        .unwrap();

    let call = &toolchain.calls_to(subcommand)[0];
    assert_eq!(call.get_args()[1].expose(), manifest.path().to_str().unwrap());
    assert_eq!(call.flag_value("--vars-store"), Some("state/creds.yml"));
    assert_eq!(
        call.flag_value("--state"),
        with_state.then_some("state/state.json")
    );
}

#[test]
fn test_commands_carry_session() {
    let toolchain = FakeToolchain::new();
    let session = session();
    DirectorClient::new(&toolchain, &session).environment().unwrap();

    let call = &toolchain.calls_to("env")[0];
    let env = call.get_env();
    assert_eq!(
        env.get(ENV_ENVIRONMENT).and_then(|v| v.as_ref()).map(|v| v.expose()),
        Some("10.0.0.5")
    );
    let secret = env.get(ENV_CLIENT_SECRET).and_then(|v| v.as_ref()).unwrap();
    assert!(secret.is_secret());
}

#[test]
fn test_environment_parses_report() {
    let toolchain = FakeToolchain::new();
    let session = session();
    let info = DirectorClient::new(&toolchain, &session).environment().unwrap();

    assert_eq!(info.name.as_deref(), Some("bosh-lab"));
    assert_eq!(info.uuid.as_deref(), Some("7d9c0f3e-2d4a-4b8e-9a61-1f2e3d4c5b6a"));
    assert_eq!(info.cpi.as_deref(), Some("vsphere_cpi"));
}

#[test]
fn test_failure_carries_client_output() {
    let toolchain = FakeToolchain::new();
    toolchain.fail("bosh", "env", 1, "Fetching info: Performing request GET");
    let session = session();

    match DirectorClient::new(&toolchain, &session).environment().unwrap_err() {
        Error::ExternalProcess { command, output, .. } => {
            assert!(command.starts_with("bosh env"));
            assert!(output.contains("Performing request"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_runtime_config_is_named() {
    let toolchain = FakeToolchain::new();
    let session = session();
    DirectorClient::new(&toolchain, &session)
        .update_runtime_config(Some("dns"), Path::new("runtime.yml"))
        .unwrap();

    let call = &toolchain.calls_to("update-runtime-config")[0];
    assert_eq!(call.flag_value("--name"), Some("dns"));
    assert_eq!(call.get_args().last().map(|a| a.expose()), Some("runtime.yml"));
}

#[test]
fn test_default_runtime_config_has_no_name() {
    let toolchain = FakeToolchain::new();
    let session = session();
    DirectorClient::new(&toolchain, &session)
        .update_runtime_config(None, Path::new("runtime.yml"))
        .unwrap();

    let call = &toolchain.calls_to("update-runtime-config")[0];
    assert_eq!(call.flag_value("--name"), None);
}

#[test]
fn test_cloud_config_uses_configured_program() {
    let toolchain = FakeToolchain::new();
    let session = session();
    DirectorClient::new(&toolchain, &session)
        .with_program("bosh2")
        .update_cloud_config(Path::new("cloud.yml"))
        .unwrap();

    let call = &toolchain.calls_to("update-cloud-config")[0];
    assert_eq!(call.program(), "bosh2");
}
