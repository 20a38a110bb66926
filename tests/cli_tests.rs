//! Integration tests for the pipe-bindings CLI
//!
//! These tests run the actual binary against manifests written to a
//! temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("pipe-bindings").unwrap();
    cmd.env_remove("KAMELET_NAMESPACE").env_remove("NAMESPACE");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const KAMELET_PIPE: &str = r#"
apiVersion: camel.apache.org/v1
kind: Pipe
metadata:
  name: timer-to-log
  namespace: test
spec:
  source:
    ref:
      kind: Kamelet
      apiVersion: camel.apache.org/v1
      name: timer-source
    properties:
      message: hello
  sink:
    uri: log:info
"#;

#[test]
fn test_help_flag() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_resolve_help() {
    cli()
        .args(["resolve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--objects"))
        .stdout(predicate::str::contains("--profile"))
        .stdout(predicate::str::contains("--grant"));
}

// ============================================================================
// resolve
// ============================================================================

#[test]
fn test_resolve_kamelet_pipe() {
    let dir = TempDir::new().unwrap();
    let pipe = write(&dir, "pipe.yaml", KAMELET_PIPE);

    cli()
        .arg("resolve")
        .arg(&pipe)
        .assert()
        .success()
        .stdout(predicate::str::contains("kamelet:timer-source/source"))
        .stdout(predicate::str::contains(
            "camel.kamelet.timer-source.source.message: hello",
        ))
        .stdout(predicate::str::contains("log:info"));
}

#[test]
fn test_resolve_kafka_topic_with_objects() {
    let dir = TempDir::new().unwrap();
    let pipe = write(
        &dir,
        "pipe.yaml",
        r#"
metadata:
  name: kafka-to-log
spec:
  source:
    ref:
      kind: KafkaTopic
      apiVersion: kafka.strimzi.io/v1beta2
      name: mytopicy
  sink:
    uri: log:info
"#,
    );
    let objects = write(
        &dir,
        "objects.yaml",
        r#"
- apiVersion: kafka.strimzi.io/v1beta2
  kind: Kafka
  metadata:
    name: my-clusterx
    namespace: test
  status:
    listeners:
      - name: plain
        bootstrapServers: my-clusterx-kafka-bootstrap:9092
- apiVersion: kafka.strimzi.io/v1beta2
  kind: KafkaTopic
  metadata:
    name: mytopicy
    namespace: test
    labels:
      strimzi.io/cluster: my-clusterx
"#,
    );

    cli()
        .arg("resolve")
        .arg(&pipe)
        .arg("--objects")
        .arg(&objects)
        .args(["--namespace", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "kafka:mytopicy?brokers=my-clusterx-kafka-bootstrap%3A9092",
        ));
}

#[test]
fn test_resolve_https_sink_on_knative_profile() {
    let dir = TempDir::new().unwrap();
    let pipe = write(
        &dir,
        "pipe.yaml",
        r#"
metadata:
  name: to-http
  namespace: test
spec:
  source:
    uri: timer:tick
  sink:
    uri: https://my-domain
"#,
    );

    cli()
        .arg("resolve")
        .arg(&pipe)
        .args(["--profile", "knative"])
        .assert()
        .success()
        .stdout(predicate::str::contains("knative:endpoint/sink"))
        .stdout(predicate::str::contains("sinkBinding: false"));
}

#[test]
fn test_resolve_missing_service_fails_with_code() {
    let dir = TempDir::new().unwrap();
    let pipe = write(
        &dir,
        "pipe.yaml",
        r#"
metadata:
  namespace: test
spec:
  source:
    uri: timer:tick
  sink:
    ref:
      kind: Service
      apiVersion: v1
      name: backend
"#,
    );

    cli()
        .arg("resolve")
        .arg(&pipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIND-030"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_resolve_unknown_profile_is_rejected() {
    let dir = TempDir::new().unwrap();
    let pipe = write(&dir, "pipe.yaml", KAMELET_PIPE);

    cli()
        .arg("resolve")
        .arg(&pipe)
        .args(["--profile", "mesos"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown profile"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_valid_pipe() {
    let dir = TempDir::new().unwrap();
    let pipe = write(&dir, "pipe.yaml", KAMELET_PIPE);

    cli()
        .arg("validate")
        .arg(&pipe)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("Endpoints: 2"));
}

const CROSS_NAMESPACE_PIPE: &str = r#"
metadata:
  name: cross
  namespace: test
spec:
  serviceAccountName: pipe-sa
  source:
    ref:
      kind: Kamelet
      apiVersion: camel.apache.org/v1
      name: timer-source
      namespace: other
  sink:
    uri: log:info
"#;

#[test]
fn test_validate_cross_namespace_denied() {
    let dir = TempDir::new().unwrap();
    let pipe = write(&dir, "pipe.yaml", CROSS_NAMESPACE_PIPE);

    cli()
        .arg("validate")
        .arg(&pipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIND-010"));
}

#[test]
fn test_validate_cross_namespace_granted() {
    let dir = TempDir::new().unwrap();
    let pipe = write(&dir, "pipe.yaml", CROSS_NAMESPACE_PIPE);

    cli()
        .arg("validate")
        .arg(&pipe)
        .args(["--grant", "pipe-sa:Kamelet:other"])
        .assert()
        .success();
}

#[test]
fn test_validate_shared_namespace_from_config() {
    let dir = TempDir::new().unwrap();
    let pipe = write(&dir, "pipe.yaml", CROSS_NAMESPACE_PIPE);
    let config = write(&dir, "config.toml", "global_template_namespace = \"other\"\n");

    cli()
        .arg("validate")
        .arg(&pipe)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn test_validate_both_ref_and_uri() {
    let dir = TempDir::new().unwrap();
    let pipe = write(
        &dir,
        "pipe.yaml",
        r#"
spec:
  source:
    uri: timer:tick
    ref:
      kind: Kamelet
      apiVersion: camel.apache.org/v1
      name: timer-source
  sink:
    uri: log:info
"#,
    );

    cli()
        .arg("validate")
        .arg(&pipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIND-001"));
}

#[test]
fn test_validate_invalid_manifest() {
    let dir = TempDir::new().unwrap();
    let pipe = write(&dir, "pipe.yaml", "metadata:\n  name: broken\nspec: [1, 2]\n");

    cli()
        .arg("validate")
        .arg(&pipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIND-061"))
        .stderr(predicate::str::contains("'ref' or 'uri'").not());
}

#[test]
fn test_validate_missing_file() {
    cli()
        .args(["validate", "/nonexistent/pipe.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIND-070"));
}
