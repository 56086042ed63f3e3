//! End-to-end runs against a fake `claude` script that behaves differently
//! per token.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use waker_core::{
    AccountSpec, ClaudeExecutor, ExecutorSettings, Orchestrator, Recorder, RunSettings,
    TimeoutPolicy, WakeOutcome,
};

const ASSISTANT_LINE: &str = r#"{"type":"assistant","session_id":"s1","parent_tool_use_id":null,"message":{"id":"msg_1","role":"assistant","model":"m","content":[{"type":"text","text":"Hi!"}],"usage":{"input_tokens":1,"output_tokens":1}}}"#;
const INIT_LINE: &str = r#"{"type":"system","subtype":"init","session_id":"s1","model":"m","tools":[],"cwd":"/tmp"}"#;

fn fake_claude(dir: &Path) -> String {
    let log = dir.join("tokens.log");
    let script = format!(
        r#"#!/bin/sh
cat > /dev/null
echo "$CLAUDE_CODE_OAUTH_TOKEN" >> '{log}'
case "$CLAUDE_CODE_OAUTH_TOKEN" in
  tok-good*) echo '{INIT_LINE}'; echo '{ASSISTANT_LINE}' ;;
  tok-slow*) echo '{INIT_LINE}'; sleep 30 ;;
  tok-quiet*) echo '{INIT_LINE}' ;;
  *) echo "Invalid OAuth token" >&2; exit 1 ;;
esac
"#,
        log = log.display()
    );
    let path = dir.join("claude");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

fn executor(claude: String, policy: TimeoutPolicy) -> ClaudeExecutor {
    ClaudeExecutor::new(ExecutorSettings {
        outer_timeout: Duration::from_secs(10),
        grace: Duration::from_millis(200),
        timeout_policy: policy,
        claude_path: Some(claude),
        ..Default::default()
    })
}

fn settings() -> RunSettings {
    RunSettings {
        per_attempt_timeout: Duration::from_millis(500),
        inter_attempt_delay: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn mixed_accounts_are_classified_and_counted() {
    let dir = TempDir::new().unwrap();
    let exec = executor(fake_claude(dir.path()), TimeoutPolicy::Optimistic);
    let accounts = vec![
        AccountSpec::new("good", "tok-good-1"),
        AccountSpec::new("unset", "your-oauth-token-here-1"),
        AccountSpec::new("slow", "tok-slow-1"),
        AccountSpec::new("quiet", "tok-quiet-1"),
        AccountSpec::new("revoked", "tok-revoked-1"),
    ];

    let mut rec = Recorder::default();
    let report = Orchestrator::new(&exec, settings())
        .run(&accounts, &mut rec)
        .await;

    let outcomes: Vec<_> = report.per_account.iter().map(|a| &a.outcome).collect();
    assert_eq!(outcomes[0], &WakeOutcome::Success);
    assert_eq!(outcomes[1], &WakeOutcome::NotConfigured);
    assert_eq!(outcomes[2], &WakeOutcome::TimeoutSent);
    assert!(matches!(outcomes[3], WakeOutcome::NoResponse(_)));
    assert!(matches!(outcomes[4], WakeOutcome::Failure(_)));
    assert_eq!(report.success_count, 2);
    assert_eq!(report.fail_count, 3);

    // Each child saw exactly its own token, in order, and the placeholder
    // never launched a child.
    let log = std::fs::read_to_string(dir.path().join("tokens.log")).unwrap();
    let seen: Vec<_> = log.lines().collect();
    assert_eq!(seen, ["tok-good-1", "tok-slow-1", "tok-quiet-1", "tok-revoked-1"]);
}

#[tokio::test]
async fn strict_policy_counts_timeouts_as_failures() {
    let dir = TempDir::new().unwrap();
    let exec = executor(fake_claude(dir.path()), TimeoutPolicy::Strict);
    let accounts = vec![AccountSpec::new("slow", "tok-slow-2")];

    let report = Orchestrator::new(&exec, settings())
        .run(&accounts, &mut Recorder::default())
        .await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.fail_count, 1);
    assert!(matches!(report.per_account[0].outcome, WakeOutcome::Failure(_)));
}
