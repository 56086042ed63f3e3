#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REAL_TOKEN: &str = "sk-ant-REDACTED";

fn waker(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("waker").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("WAKER_CONFIG")
        .env("RUST_LOG", "info");
    cmd
}

fn write_config(dir: &TempDir, body: &str) {
    std::fs::write(dir.path().join("config.yaml"), body).unwrap();
}

fn valid_config() -> String {
    format!(
        r#"
accounts:
  - name: primary
    token: {REAL_TOKEN}
  - name: backup
    token: your-oauth-token-here-2
wake_hours: [6, 11, 16, 21]
"#
    )
}

// ---------------------------------------------------------------------------
// waker check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_config_masks_tokens() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &valid_config());

    waker(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("primary"))
        .stdout(predicate::str::contains("not configured"))
        .stdout(predicate::str::contains("06:00, 11:00, 16:00, 21:00"))
        .stdout(predicate::str::contains(REAL_TOKEN).not())
        .stderr(predicate::str::contains(REAL_TOKEN).not());
}

#[test]
fn check_json_lists_accounts() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &valid_config());

    let output = waker(&dir).args(["check", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["accounts"][0]["name"], "primary");
    assert_eq!(value["accounts"][0]["status"], "configured");
    assert_eq!(value["accounts"][1]["status"], "not configured");
    assert_eq!(value["wake_hours"], serde_json::json!([6, 11, 16, 21]));
    assert!(!String::from_utf8_lossy(&output.stdout).contains(REAL_TOKEN));
}

#[test]
fn check_reports_invalid_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "accounts: []\nwake_hours: [25]\n");

    waker(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("no accounts"))
        .stdout(predicate::str::contains("out of range"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn missing_config_is_a_readable_error() {
    let dir = TempDir::new().unwrap();

    waker(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"))
        .stderr(predicate::str::contains("config.yaml.example"));
}

#[test]
fn explicit_config_flag_is_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("elsewhere.yaml");
    std::fs::write(&path, valid_config()).unwrap();

    waker(&dir)
        .args(["--config", path.to_str().unwrap(), "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.yaml"));
}

#[test]
fn config_env_var_is_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("from-env.yaml");
    std::fs::write(&path, valid_config()).unwrap();

    waker(&dir)
        .env("WAKER_CONFIG", &path)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env.yaml"));
}

// ---------------------------------------------------------------------------
// waker run
// ---------------------------------------------------------------------------

const PLACEHOLDER_ONLY: &str = r#"
accounts:
  - name: one
    token: your-oauth-token-here-1
  - name: two
    token: ""
wake:
  inter_attempt_delay_secs: 0
wake_hours: [6]
"#;

#[test]
fn run_with_placeholders_only_completes_with_failures() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, PLACEHOLDER_ONLY);

    waker(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("not_configured"))
        .stdout(predicate::str::contains("0 succeeded, 2 failed"));
}

#[test]
fn run_fail_on_error_sets_exit_status() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, PLACEHOLDER_ONLY);

    waker(&dir)
        .args(["run", "--fail-on-error"])
        .assert()
        .code(1);
}

#[test]
fn run_json_report_shape() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, PLACEHOLDER_ONLY);

    let output = waker(&dir).args(["--json", "run"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["success_count"], 0);
    assert_eq!(value["fail_count"], 2);
    assert_eq!(value["interrupted"], false);
    assert_eq!(value["per_account"][0]["name"], "one");
    assert_eq!(value["per_account"][0]["outcome"], "not_configured");
}

#[test]
fn run_unknown_account_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, PLACEHOLDER_ONLY);

    waker(&dir)
        .args(["run", "--account", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown account: nobody"));
}

#[test]
fn run_refuses_invalid_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "accounts:\n  - name: a\n    token: x\n");

    waker(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config validation failed"))
        .stderr(predicate::str::contains("wake_hours"));
}

#[test]
fn log_file_receives_outcomes() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, PLACEHOLDER_ONLY);
    let log = dir.path().join("waker.log");

    waker(&dir)
        .args(["--log-file", log.to_str().unwrap(), "run"])
        .assert()
        .success();

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains("waker run started"));
    assert!(content.contains("one - not configured"));
    assert!(!content.contains("\u{1b}["), "log file must not contain ANSI codes");
}

#[cfg(unix)]
fn fake_claude(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = r#"#!/bin/sh
cat > /dev/null
echo '{"type":"system","subtype":"init","session_id":"s1","model":"m"}'
echo '{"type":"assistant","session_id":"s1","message":{"model":"m","content":[{"type":"text","text":"Hello"}]}}'
"#;
    let path = dir.join("claude");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn run_selected_account_against_fake_claude() {
    let dir = TempDir::new().unwrap();
    let claude = fake_claude(dir.path());
    write_config(
        &dir,
        &format!(
            r#"
accounts:
  - name: primary
    token: {REAL_TOKEN}
  - name: secondary
    token: sk-ant-REDACTED
wake_hours: [6]
wake:
  attempt_timeout_secs: 10
  outer_timeout_secs: 20
  inter_attempt_delay_secs: 0
  grace_secs: 1
  claude_path: {}
"#,
            claude.display()
        ),
    );

    let output = waker(&dir)
        .args(["--json", "run", "--account", "secondary", "--fail-on-error"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["success_count"], 1);
    assert_eq!(value["fail_count"], 0);
    assert_eq!(value["per_account"].as_array().unwrap().len(), 1);
    assert_eq!(value["per_account"][0]["name"], "secondary");
    assert_eq!(value["per_account"][0]["outcome"], "success");
    assert!(!String::from_utf8_lossy(&output.stderr).contains(REAL_TOKEN));
}
