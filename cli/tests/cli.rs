use assert_cmd::Command;

fn scorecard() -> Command {
    let mut cmd = Command::cargo_bin("scorecard").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn list_basic_tests() {
    let output = scorecard().arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("checkspec"));
    assert!(stdout.contains("writingintocrshaseffect"));
}

#[test]
fn list_olm_tests_as_json() {
    let output = scorecard()
        .args(["list", "--plugin", "olm", "--selector", "test=bundlevalidationtest", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"bundlevalidation\""));
    assert!(!stdout.contains("\"specdescriptors\""));
}

#[test]
fn list_reads_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("scorecard.yaml");
    std::fs::write(&config, "plugin: olm\nselector: necessity=recommended\n").unwrap();
    let output = scorecard()
        .arg("--config")
        .arg(&config)
        .args(["list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"crdshaveresources\""));
    assert!(!stdout.contains("\"bundlevalidation\""));
}

#[test]
fn invalid_selector_fails() {
    scorecard()
        .args(["list", "--selector", "suite in (basic"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn run_without_cr_manifest_fails_before_contacting_the_cluster() {
    let output = scorecard().arg("run").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("cr-manifest"), "{}", stderr);
}
