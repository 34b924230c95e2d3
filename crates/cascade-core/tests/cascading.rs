//! End-to-end cascading scenarios: a parent job, a child that cascades
//! from it, an override on the child, and a reset back to inherited.

use cascade_core::{
    CascadingConfigResolver, ErrorKind, PropertyDefaults, ResolverOptions, Value, ValueSource,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn job_defaults() -> PropertyDefaults {
    PropertyDefaults::from_yaml(
        r#"
logRotator: "off"
blockBuildWhenUpstreamBuilding: false
scm:
  type: none
"#,
    )
    .unwrap()
}

fn prepare_cascading(parent: &str, child: &str) -> CascadingConfigResolver {
    init_logging();
    let mut jobs = CascadingConfigResolver::with_config(job_defaults(), ResolverOptions::default());
    jobs.create_node(parent, None).unwrap();
    jobs.create_node(child, Some(parent)).unwrap();
    jobs
}

/// Override a property on the child, check the reset link appears, reset,
/// check it is gone and the inherited value is back
fn assert_override_then_reset(child: &str, key: &str, value: Value) {
    let mut jobs = prepare_cascading(&format!("parent-{}", child), child);
    let inherited = jobs.resolve(child, key).unwrap();
    let link = format!("/job/{}/resetProjectProperty?propertyName={}", child, key);

    jobs.set_override(child, key, value.clone()).unwrap();
    assert_eq!(jobs.resolve(child, key).unwrap().value(), Some(&value));
    assert_eq!(jobs.reset_link(child, key).unwrap(), Some(link));

    jobs.reset_override(child, key).unwrap();
    assert_eq!(jobs.reset_link(child, key).unwrap(), None);
    assert_eq!(jobs.resolve(child, key).unwrap(), inherited);
}

#[test]
fn log_rotator_override_and_reset() {
    let mut jobs = prepare_cascading("parent", "child");

    jobs.set_override("child", "logRotator", Value::mapping([("days", 2)]))
        .unwrap();
    assert_eq!(
        jobs.resolve("child", "logRotator").unwrap().value(),
        Some(&Value::mapping([("days", 2)]))
    );

    jobs.reset_override("child", "logRotator").unwrap();
    let eff = jobs.resolve("child", "logRotator").unwrap();
    assert_eq!(eff.value(), Some(&Value::from("off")));
    assert_eq!(eff.source, ValueSource::Default);
}

#[test]
fn cascading_log_rotate() {
    assert_override_then_reset("child-logrotate", "logRotator", Value::mapping([("days", 2)]));
}

#[test]
fn cascading_block_build_upstream() {
    assert_override_then_reset(
        "child-upstream",
        "blockBuildWhenUpstreamBuilding",
        Value::Bool(true),
    );
}

#[test]
fn cascading_scm() {
    assert_override_then_reset(
        "child-scm",
        "scm",
        Value::mapping([
            ("type", "git"),
            ("url", "git://github.com/hudson-plugins/cvs-plugin.git"),
        ]),
    );
}

#[test]
fn cascading_inheritance_reaches_grandchild() {
    let mut jobs = prepare_cascading("parent", "child1");
    jobs.create_node("child2", Some("child1")).unwrap();

    // Set on the root after the chain already exists
    jobs.set_override(
        "parent",
        "junitTestResults",
        "**/target/surefire-reports/*.xml",
    )
    .unwrap();

    let eff = jobs.resolve("child2", "junitTestResults").unwrap();
    assert_eq!(
        eff.value(),
        Some(&Value::from("**/target/surefire-reports/*.xml"))
    );
    assert_eq!(
        eff.source,
        ValueSource::Inherited {
            from: "parent".into()
        }
    );
    assert!(!jobs.is_locally_overridden("child2", "junitTestResults").unwrap());
}

#[test]
fn reset_without_override_is_rejected() {
    let mut jobs = prepare_cascading("parent", "child");
    let before = jobs.to_snapshot();

    let err = jobs.reset_override("child", "logRotator").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotOverridden { .. }));
    assert_eq!(jobs.to_snapshot(), before);
}

#[test]
fn reverse_link_is_a_cycle() {
    let mut jobs = prepare_cascading("parent", "child");

    let err = jobs.set_parent("parent", Some("child")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Cycle { .. }));
    assert_eq!(jobs.parent("child").unwrap(), Some("parent"));
    assert_eq!(jobs.parent("parent").unwrap(), None);
}

#[test]
fn snapshot_file_round_trip() {
    let mut jobs = prepare_cascading("parent", "child");
    jobs.set_override("child", "scm", Value::mapping([("type", "git")]))
        .unwrap();

    let dir = std::env::temp_dir().join(format!("cascade-core-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    for file in ["jobs.yaml", "jobs.json"] {
        let path = dir.join(file);
        jobs.save(&path).unwrap();
        let loaded = CascadingConfigResolver::load(&path).unwrap();
        assert_eq!(loaded.to_snapshot(), jobs.to_snapshot());
    }

    std::fs::remove_dir_all(&dir).unwrap();
}
