//! Wake executor: one bounded-time wake attempt for one account.
//!
//! Every attempt runs in its own `claude` subprocess. The credential is put
//! into that child's environment only, so no two accounts ever share
//! process-global state. Two independent deadlines apply:
//!
//! ```text
//! Idle → Launching → AwaitingResponse → Success | NoResponse | Failure
//!                         │
//!                         └─ attempt timeout ─→ TimeoutSent  (strict: Failure)
//! * ─ outer timeout ─→ kill child → Failure("outer timeout")
//! ```
//!
//! An outer timeout that fires while a classified child is being torn down
//! still kills it, but the classification stands.
//!
//! The attempt timeout only starts once the prompt has been written to the
//! child, which is why an expiry is reported as `TimeoutSent`: the request
//! is already out even though nothing came back.

use crate::account::Credential;
use crate::outcome::WakeOutcome;
use async_trait::async_trait;
use claude_agent::{ClaudeAgentError, ClaudeProcess, QueryOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Environment variable the Claude CLI reads its OAuth token from.
pub const CREDENTIAL_ENV: &str = "CLAUDE_CODE_OAUTH_TOKEN";

/// Credentials the parent may carry that must not leak into a child.
const INHERITED_CREDENTIALS: &[&str] = &[
    "CLAUDE_CODE_OAUTH_TOKEN",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_AUTH_TOKEN",
];

/// Upper bound on reaping a child after the outer timeout fired.
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Slack added on top of attempt timeout + grace when the configured outer
/// timeout is too small to be usable.
const OUTER_MARGIN: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How an expired attempt timeout is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// The prompt was sent, so assume the usage window started.
    #[default]
    Optimistic,
    /// Require a confirmed response; a timeout is a failure.
    Strict,
}

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Greeting sent to the remote side.
    pub prompt: String,
    /// Hard bound on launch + response + teardown.
    pub outer_timeout: Duration,
    /// Time a child gets to exit on its own after classification.
    pub grace: Duration,
    pub timeout_policy: TimeoutPolicy,
    /// `claude` binary to run (default: `claude` on `PATH`).
    pub claude_path: Option<String>,
    pub model: Option<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            prompt: "hi".to_string(),
            outer_timeout: Duration::from_secs(70),
            grace: Duration::from_secs(5),
            timeout_policy: TimeoutPolicy::Optimistic,
            claude_path: None,
            model: None,
        }
    }
}

// ---------------------------------------------------------------------------
// WakeExecutor
// ---------------------------------------------------------------------------

/// Runs one wake attempt. Implementations never return errors: every
/// expected failure is folded into the returned [`WakeOutcome`].
#[async_trait]
pub trait WakeExecutor: Send + Sync {
    async fn attempt_wake(&self, credential: &Credential, timeout: Duration) -> WakeOutcome;
}

#[derive(Debug, Error)]
enum WakeError {
    #[error("launch failed: {0}")]
    Launch(#[source] ClaudeAgentError),

    #[error("stream error: {0}")]
    Stream(#[source] ClaudeAgentError),

    #[error("{0}")]
    Exited(#[source] ClaudeAgentError),

    #[error("no response within {0:?}")]
    StrictTimeout(Duration),

    #[error("outer timeout")]
    OuterTimeout,
}

impl From<WakeError> for WakeOutcome {
    fn from(e: WakeError) -> Self {
        WakeOutcome::Failure(e.to_string())
    }
}

/// How the read phase ended, before any exit status is consulted.
enum Read {
    Content(String),
    Closed,
    Failed(ClaudeAgentError),
}

/// State of one attempt that outlives its future when the outer timeout
/// cancels it.
#[derive(Default)]
struct Attempt {
    process: Option<ClaudeProcess>,
    classified: Option<WakeOutcome>,
}

// ---------------------------------------------------------------------------
// InFlight
// ---------------------------------------------------------------------------

/// Handle on the process group of the attempt currently running, so it can
/// be killed from outside the attempt, e.g. when the user aborts the run.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    group: Arc<Mutex<Option<u32>>>,
}

impl InFlight {
    fn set(&self, group: Option<u32>) {
        if let Ok(mut g) = self.group.lock() {
            *g = group;
        }
    }

    /// Kill the running attempt's whole process group. Returns `false` when
    /// no attempt is in flight.
    pub fn kill(&self) -> bool {
        let group = self.group.lock().ok().and_then(|mut g| g.take());
        match group {
            Some(pgid) => {
                tracing::warn!(pgid, "killing in-flight wake attempt");
                claude_agent::kill_process_group(pgid);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ClaudeExecutor
// ---------------------------------------------------------------------------

/// Wakes an account by running the Claude CLI once with that account's token.
#[derive(Debug, Clone, Default)]
pub struct ClaudeExecutor {
    settings: ExecutorSettings,
    in_flight: InFlight,
}

impl ClaudeExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self {
            settings,
            in_flight: InFlight::default(),
        }
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Shared handle on the attempt this executor is currently running.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// The outer bound actually applied to an attempt with `timeout`.
    fn outer_timeout(&self, timeout: Duration) -> Duration {
        if self.settings.outer_timeout > timeout {
            return self.settings.outer_timeout;
        }
        let widened = timeout
            .saturating_add(self.settings.grace)
            .saturating_add(OUTER_MARGIN);
        tracing::warn!(
            outer = ?self.settings.outer_timeout,
            attempt = ?timeout,
            "outer timeout not above attempt timeout, using {widened:?}"
        );
        widened
    }

    fn query_options(&self, credential: &Credential) -> QueryOptions {
        let mut env = HashMap::new();
        env.insert(CREDENTIAL_ENV.to_string(), credential.expose().to_string());
        QueryOptions {
            model: self.settings.model.clone(),
            max_turns: Some(1),
            env,
            env_remove: INHERITED_CREDENTIALS.iter().map(|s| s.to_string()).collect(),
            path_to_executable: self.settings.claude_path.clone(),
            no_session_persistence: true,
            detach_process_group: true,
            ..Default::default()
        }
    }

    /// Launch, read, classify, tear down. Runs under the outer timeout; the
    /// child and the classification are parked in `attempt` so the caller
    /// can kill the one and keep the other if that fires.
    async fn drive(
        &self,
        attempt: &mut Attempt,
        credential: &Credential,
        timeout: Duration,
    ) -> WakeOutcome {
        let opts = self.query_options(credential);
        let process = match claude_agent::spawn(&self.settings.prompt, &opts).await {
            Ok(p) => attempt.process.insert(p),
            Err(e) => return WakeError::Launch(e).into(),
        };
        self.in_flight.set(process.process_group());
        tracing::debug!(pid = ?process.id(), "wake prompt sent");

        let mut exited = false;
        let outcome = match tokio::time::timeout(timeout, read_until_content(process)).await {
            Ok(Read::Content(label)) => {
                tracing::debug!(message = %label, "received response");
                WakeOutcome::Success
            }
            Ok(Read::Closed) => {
                exited = process.wait_for_exit(self.settings.grace).await;
                let exit_error = if exited {
                    process.wait_exit_error().await
                } else {
                    None
                };
                match exit_error {
                    Some(e) => WakeError::Exited(e).into(),
                    None => WakeOutcome::NoResponse("stream closed without a response".into()),
                }
            }
            Ok(Read::Failed(e)) => WakeError::Stream(e).into(),
            Err(_) => match self.settings.timeout_policy {
                TimeoutPolicy::Optimistic => WakeOutcome::TimeoutSent,
                TimeoutPolicy::Strict => WakeError::StrictTimeout(timeout).into(),
            },
        };

        attempt.classified = Some(outcome.clone());

        if !exited && !process.wait_for_exit(self.settings.grace).await {
            tracing::debug!(pid = ?process.id(), "child still running after grace period, killing");
            process.kill().await;
        }
        self.in_flight.set(None);
        attempt.process.take();
        outcome
    }
}

#[async_trait]
impl WakeExecutor for ClaudeExecutor {
    async fn attempt_wake(&self, credential: &Credential, timeout: Duration) -> WakeOutcome {
        let outer = self.outer_timeout(timeout);

        let started = Instant::now();
        let mut attempt = Attempt::default();
        let result =
            tokio::time::timeout(outer, self.drive(&mut attempt, credential, timeout)).await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => {
                if let Some(mut process) = attempt.process.take() {
                    tracing::warn!(pid = ?process.id(), elapsed = ?started.elapsed(), "outer timeout, killing child");
                    if tokio::time::timeout(REAP_TIMEOUT, process.kill()).await.is_err() {
                        tracing::error!("child did not exit after kill");
                    }
                }
                self.in_flight.set(None);
                match attempt.classified {
                    Some(outcome) => outcome,
                    None => WakeError::OuterTimeout.into(),
                }
            }
        }
    }
}

/// Read until the first non-housekeeping message or end of stream.
async fn read_until_content(process: &mut ClaudeProcess) -> Read {
    loop {
        match process.next_message().await {
            Ok(Some(msg)) if msg.is_housekeeping() => {
                tracing::debug!(message = %msg.label(), "skipping housekeeping message");
            }
            Ok(Some(msg)) => return Read::Content(msg.label()),
            Ok(None) => return Read::Closed,
            Err(e) => return Read::Failed(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
