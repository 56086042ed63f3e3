use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WakeOutcome
// ---------------------------------------------------------------------------

/// Classified result of one account's wake attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum WakeOutcome {
    /// A non-housekeeping message arrived within the attempt timeout.
    Success,
    /// No confirmation within the attempt timeout. The prompt had already
    /// been written to the child, so the usage window is assumed started.
    TimeoutSent,
    /// The stream closed cleanly without any substantive message.
    NoResponse(String),
    /// Launch, transport or protocol error, or the outer timeout fired.
    Failure(String),
    /// The credential is empty or a placeholder; no attempt was made.
    NotConfigured,
}

impl WakeOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        WakeOutcome::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WakeOutcome::Success | WakeOutcome::TimeoutSent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WakeOutcome::Success => "success",
            WakeOutcome::TimeoutSent => "timeout_sent",
            WakeOutcome::NoResponse(_) => "no_response",
            WakeOutcome::Failure(_) => "failure",
            WakeOutcome::NotConfigured => "not_configured",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            WakeOutcome::NoResponse(r) | WakeOutcome::Failure(r) => Some(r),
            _ => None,
        }
    }
}

impl std::fmt::Display for WakeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WakeOutcome::Success => write!(f, "woken"),
            WakeOutcome::TimeoutSent => write!(f, "timed out, wake request sent"),
            WakeOutcome::NoResponse(reason) => write!(f, "no response: {reason}"),
            WakeOutcome::Failure(reason) => write!(f, "failed: {reason}"),
            WakeOutcome::NotConfigured => write!(f, "not configured"),
        }
    }
}

// ---------------------------------------------------------------------------
// WakeReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOutcome {
    pub name: String,
    #[serde(flatten)]
    pub outcome: WakeOutcome,
}

/// Aggregate of one orchestrator run, in account order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WakeReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub per_account: Vec<AccountOutcome>,
    /// A stop request ended the run before every account was processed.
    pub interrupted: bool,
}

impl WakeReport {
    pub fn record(&mut self, name: impl Into<String>, outcome: WakeOutcome) {
        if outcome.is_success() {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
        self.per_account.push(AccountOutcome {
            name: name.into(),
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.per_account.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.fail_count == 0 && !self.interrupted
    }
}
