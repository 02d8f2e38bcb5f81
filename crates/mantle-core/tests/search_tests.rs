use mantle_core::{Error, InterpolationEngine, KeyPath, VariableSearchIndex, lookup_in};
use mantle_fs::{EnvironmentLayout, aggregate_variable_sources};
use mantle_test_utils::{FakeToolchain, TestEnv};
use pretty_assertions::assert_eq;

fn key(raw: &str) -> KeyPath {
    KeyPath::new(raw).unwrap()
}

#[test]
fn test_first_source_wins_and_later_sources_are_not_probed() {
    let env = TestEnv::new();
    let first = env.variable("a.yml", "internal_ip: 10.0.0.5\n");
    env.variable("b.yml", "internal_ip: 10.0.0.6\n");
    env.settings("internal_ip: 10.0.0.7\n");

    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");
    let sources = aggregate_variable_sources(&EnvironmentLayout::with_defaults(env.root())).unwrap();
    let index = VariableSearchIndex::new(&engine, &sources);

    let found = index.find(&key("internal_ip")).unwrap();
    assert_eq!(found.value, "10.0.0.5");
    assert_eq!(found.source, first);
    assert_eq!(toolchain.lookups(), vec![(first, "/internal_ip".to_string())]);
}

#[test]
fn test_probes_in_order_until_match() {
    let env = TestEnv::new();
    let a = env.variable("a.yml", "other: 1\n");
    env.secrets("admin_password: s3cret\n");
    let settings = env.settings("director_name: bosh.lab.example\n");

    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");
    let sources = aggregate_variable_sources(&EnvironmentLayout::with_defaults(env.root())).unwrap();
    let index = VariableSearchIndex::new(&engine, &sources);

    let found = index.find(&key("/director_name")).unwrap();
    assert_eq!(found.value, "bosh.lab.example");
    assert_eq!(found.source, settings);

    let probed: Vec<_> = toolchain.lookups().into_iter().map(|(src, _)| src).collect();
    assert_eq!(probed, vec![a, env.root().join("state/creds.yml"), settings]);
}

#[test]
fn test_missing_everywhere_is_key_not_found() {
    let env = TestEnv::new();
    env.variable("a.yml", "other: 1\n");
    env.settings("more: 2\n");

    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");
    let sources = aggregate_variable_sources(&EnvironmentLayout::with_defaults(env.root())).unwrap();
    let index = VariableSearchIndex::new(&engine, &sources);

    match index.find(&key("/director_name")).unwrap_err() {
        Error::KeyNotFound { key, searched } => {
            assert_eq!(key, "/director_name");
            assert_eq!(searched, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_nested_values_keep_inner_newlines() {
    let env = TestEnv::new();
    let secrets = env.secrets(
        "director_ssl:\n  ca: |\n    -----BEGIN CERTIFICATE-----\n    abc\n    -----END CERTIFICATE-----\n",
    );

    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");

    let found = lookup_in(&engine, &secrets, &key("/director_ssl/ca")).unwrap();
    assert_eq!(
        found.value,
        "-----BEGIN CERTIFICATE-----\nabc\n-----END CERTIFICATE-----"
    );
}

#[test]
fn test_lookup_in_absent_document_skips_engine() {
    let env = TestEnv::new();
    let toolchain = FakeToolchain::new();
    let engine = InterpolationEngine::new(&toolchain, "bosh");

    let err = lookup_in(&engine, &env.root().join("state/creds.yml"), &key("/admin_password"))
        .unwrap_err();
    assert!(matches!(err, Error::KeyNotFound { .. }));
    assert!(toolchain.calls().is_empty());
}
