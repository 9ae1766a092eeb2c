//! Integration tests for the collector and training binaries.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;

fn write_config(dir: &std::path::Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("vehicle-recognition.toml");
    fs::write(
        &path,
        format!("project_root = {:?}\n{}", dir.display().to_string(), extra),
    )
    .unwrap();
    path
}

#[test]
fn collector_fails_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = cargo_bin_cmd!("collect-datasets");
    cmd.env("VEHICLE_RECOGNITION_CONFIG", &config);

    cmd.assert().failure();
    assert!(!dir.path().join("data/raw").exists());
}

#[test]
fn collector_verify_only_passes_on_populated_tree() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[[collector.datasets]]
name = "owner/set"
output_dir = "set"
min_files = 2
"#,
    );
    let set = dir.path().join("data/raw/set/images");
    fs::create_dir_all(&set).unwrap();
    fs::write(set.join("a.jpg"), b"x").unwrap();
    fs::write(set.join("b.jpg"), b"x").unwrap();

    let mut cmd = cargo_bin_cmd!("collect-datasets");
    cmd.env("VEHICLE_RECOGNITION_CONFIG", &config)
        .args(["--verify-only", "--json"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"verified\": true"))
        .stdout(predicate::str::contains("\"file_count\": 2"));
}

#[test]
fn collector_verify_only_fails_below_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[[collector.datasets]]
name = "owner/set"
output_dir = "set"
min_files = 5
"#,
    );
    fs::create_dir_all(dir.path().join("data/raw/set")).unwrap();
    fs::write(dir.path().join("data/raw/set/a.jpg"), b"x").unwrap();

    let mut cmd = cargo_bin_cmd!("collect-datasets");
    cmd.env("VEHICLE_RECOGNITION_CONFIG", &config).arg("--verify-only");

    cmd.assert().failure();
}

#[test]
fn skip_train_writes_descriptor_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = cargo_bin_cmd!("train-model");
    cmd.env("VEHICLE_RECOGNITION_CONFIG", &config).arg("--skip-train");

    cmd.assert().success();
    let yaml = fs::read_to_string(dir.path().join("models/dataset.yaml")).unwrap();
    assert!(yaml.contains("nc: 11"));
    assert!(yaml.contains("- armored_personnel_carrier"));
    assert!(yaml.contains("val: images/val"));
}

#[test]
fn export_without_weights_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = cargo_bin_cmd!("train-model");
    cmd.env("VEHICLE_RECOGNITION_CONFIG", &config)
        .args(["--skip-train", "--export", "onnx"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--weights"));
}
