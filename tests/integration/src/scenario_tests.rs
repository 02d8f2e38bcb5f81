//! End-to-end scenarios across the mantle crates
//!
//! These tests exercise the complete flow: variable aggregation -> session
//! discovery -> manifest rendering -> director and credential-store calls,
//! with the external clients replaced by `FakeToolchain`.

use std::fs;

use mantle_core::{
    CleanupRegistry, CredentialStoreBootstrapper, DirectorAction, DirectorClient, FileSetResolver,
    InterpolationEngine, ManifestInterpolator, RenderRequest, SessionCredentialResolver,
    SessionEnvironment, Settings, TrustChainKeys, credhub_url,
};
use mantle_fs::{EnvironmentLayout, aggregate_variable_sources};
use mantle_test_utils::{FakeToolchain, TestEnv};
use pretty_assertions::assert_eq;

/// Environment root with two operations fragments and an internal IP.
fn lab_environment() -> TestEnv {
    let env = TestEnv::new();
    env.operation("00-base.yml", "name: bosh\ninstance_groups: []\n");
    env.operation("10-network.yml", "- type: replace\n  path: /networks?\n  value: []\n");
    env.variable("creds.yml", "internal_ip: 10.0.0.5\ndirector_name: bosh.lab.internal\n");
    env
}

#[test]
fn test_unreachable_name_falls_back_and_render_succeeds() {
    let env = lab_environment();
    env.secrets("admin_password: s3cret\n");

    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");
    let layout = EnvironmentLayout::with_defaults(env.root());
    let settings = Settings::default();

    // session
    let probe = |_: &str| false;
    let resolver = SessionCredentialResolver::new(&engine, &probe, &layout, &settings.session);
    let mut session = SessionEnvironment::default();
    resolver.resolve_into(&mut session).unwrap();
    assert_eq!(session.target_address(), Some("10.0.0.5"));

    // render
    let sources = aggregate_variable_sources(&layout).unwrap();
    let output = env.root().join("manifest.yml");
    let interpolator =
        ManifestInterpolator::new(&engine, FileSetResolver::new(layout.fragment_filter()));
    let outcome = interpolator
        .render(&RenderRequest::new(layout.operations_dir(), &output, sources))
        .unwrap();

    assert_eq!(outcome.exit_code(), 0);
    let render_call = toolchain
        .calls_to("interpolate")
        .into_iter()
        .find(|call| call.flag_value("--path").is_none())
        .unwrap();
    assert!(render_call.get_args()[1].expose().ends_with("00-base.yml"));
    assert_eq!(render_call.flag_values("-o").len(), 1);
    assert!(render_call.flag_values("-o")[0].ends_with("10-network.yml"));
    assert_eq!(render_call.flag_values("-l").len(), 2);
    assert!(render_call.flag_values("-l")[0].ends_with("variables/creds.yml"));
    assert!(fs::read_to_string(&output).unwrap().starts_with("name: bosh\n"));
}

#[test]
fn test_deploy_then_login_with_discovered_session() {
    let env = lab_environment();
    env.secrets(
        "\
admin_password: s3cret
director_ssl:
  ca: director-ca
uaa_ssl:
  ca: uaa-ca
credhub_tls:
  ca: credhub-ca
credhub_admin_client_secret: hunter2
",
    );

    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");
    let layout = EnvironmentLayout::with_defaults(env.root());
    let settings = Settings::default();

    let probe = |host: &str| host == "bosh.lab.internal";
    let mut session = SessionEnvironment::default();
    SessionCredentialResolver::new(&engine, &probe, &layout, &settings.session)
        .resolve_into(&mut session)
        .unwrap();
    assert_eq!(session.target_address(), Some("bosh.lab.internal"));
    assert_eq!(
        session.credentials().ca_certificate.as_deref(),
        Some("director-ca")
    );

    let manifest = env.root().join("manifest.yml");
    let sources = aggregate_variable_sources(&layout).unwrap();
    ManifestInterpolator::new(&engine, FileSetResolver::new(layout.fragment_filter()))
        .render(&RenderRequest::new(layout.operations_dir(), &manifest, sources))
        .unwrap();

    DirectorClient::new(&toolchain, &session)
        .apply(
            DirectorAction::CreateOrUpdate,
            &manifest,
            &layout.state_file(),
            &layout.vars_store(),
        )
        .unwrap();
    let deploy = &toolchain.calls_to("create-env")[0];
    assert!(deploy.flag_value("--state").unwrap().ends_with("state/state.json"));
    assert!(
        deploy
            .get_env()
            .get("BOSH_ENVIRONMENT")
            .and_then(|v| v.as_ref())
            .is_some_and(|v| v.expose() == "bosh.lab.internal")
    );

    let scratch = tempfile::tempdir().unwrap();
    let registry = CleanupRegistry::in_dir(scratch.path());
    let store = &settings.credential_store;
    let url = credhub_url(session.target_address().unwrap(), store.port);
    CredentialStoreBootstrapper::new(
        &engine,
        &toolchain,
        &registry,
        &layout,
        TrustChainKeys {
            uaa_ca: store.uaa_ca_key.clone(),
            tls_ca: store.tls_ca_key.clone(),
        },
    )
    .login(&url, &store.username, &store.secret_key)
    .unwrap();

    let login = &toolchain.calls_to("login")[0];
    assert_eq!(login.flag_value("-s"), Some("https://bosh.lab.internal:8844"));
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn test_bring_your_own_session_keeps_client_untouched() {
    let env = lab_environment();
    env.secrets("admin_password: s3cret\n");

    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");
    let layout = EnvironmentLayout::with_defaults(env.root());
    let mut settings = Settings::default();
    settings.session.admin_username = String::new();

    let probe = |_: &str| false;
    let mut session = SessionEnvironment::default();
    SessionCredentialResolver::new(&engine, &probe, &layout, &settings.session)
        .resolve_into(&mut session)
        .unwrap();

    DirectorClient::new(&toolchain, &session).environment().unwrap();
    let call = &toolchain.calls_to("env")[0];
    assert!(!call.get_env().contains_key("BOSH_CLIENT"));
    assert!(!call.get_env().contains_key("BOSH_CLIENT_SECRET"));
    assert!(session.describe(false).contains("export BOSH_ENVIRONMENT=10.0.0.5"));
}
