//! Integration tests for config loading.

use std::path::PathBuf;

use tempfile::TempDir;

use skiff_core::config::{ConfigStore, DeployConfig};
use skiff_core::types::CpuArchitecture;

#[test]
fn absent_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_path(temp.path().join("skiff.toml"));

    let config = store.load().expect("load should succeed");
    assert_eq!(config, DeployConfig::default());
}

#[test]
fn file_values_override_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("skiff.toml");
    std::fs::write(
        &path,
        r#"
hostname = "aws-ec2-7"
model_path = "artifacts/model.bin"
architecture = "arm64"
"#,
    )
    .unwrap();

    let config = ConfigStore::from_path(&path).load().expect("load should succeed");
    assert_eq!(config.hostname, "aws-ec2-7");
    assert_eq!(config.model_path, PathBuf::from("artifacts/model.bin"));
    assert_eq!(config.architecture, CpuArchitecture::Arm64);

    // Untouched fields keep their defaults.
    assert_eq!(config.remote_user, "ec2-user");
    assert_eq!(config.remote_dir, "/usr/local/bot");
}

#[test]
fn malformed_file_reports_its_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("skiff.toml");
    std::fs::write(&path, "hostname = [not toml").unwrap();

    let err = ConfigStore::from_path(&path).load().unwrap_err();
    assert!(err.to_string().contains("Invalid config file"));
}
