//! Reporting sink for orchestrator lifecycle events.
//!
//! The orchestrator never logs directly; it hands structured [`WakeEvent`]s
//! to whatever [`ReportSink`] the caller threads in. [`TracingSink`] turns
//! them into log lines, [`Recorder`] keeps them for assertions.

use crate::outcome::WakeOutcome;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WakeEvent {
    RunStarted {
        accounts: usize,
    },
    AttemptStarted {
        index: usize,
        total: usize,
        name: String,
    },
    AccountFinished {
        name: String,
        outcome: WakeOutcome,
        elapsed: Duration,
    },
    RunInterrupted {
        remaining: usize,
    },
    RunFinished {
        success: usize,
        failed: usize,
        elapsed: Duration,
    },
}

pub trait ReportSink: Send {
    fn record(&mut self, event: WakeEvent);
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Renders events as human-readable `tracing` lines, one per event, as they
/// happen.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn record(&mut self, event: WakeEvent) {
        match event {
            WakeEvent::RunStarted { accounts } => {
                tracing::info!("{}", "=".repeat(60));
                tracing::info!(accounts, "waker run started: {accounts} account(s)");
            }
            WakeEvent::AttemptStarted { index, total, name } => {
                tracing::info!(account = %name, "[{}/{}] waking {name}", index + 1, total);
            }
            WakeEvent::AccountFinished {
                name,
                outcome,
                elapsed,
            } => {
                let secs = elapsed.as_secs_f64();
                match &outcome {
                    WakeOutcome::Success => {
                        tracing::info!(account = %name, outcome = outcome.as_str(), elapsed_secs = secs,
                            "\u{2705} {name} - {outcome} ({secs:.1}s)");
                    }
                    WakeOutcome::TimeoutSent
                    | WakeOutcome::NoResponse(_)
                    | WakeOutcome::NotConfigured => {
                        tracing::warn!(account = %name, outcome = outcome.as_str(), elapsed_secs = secs,
                            "\u{26a0}\u{fe0f}  {name} - {outcome} ({secs:.1}s)");
                    }
                    WakeOutcome::Failure(_) => {
                        tracing::error!(account = %name, outcome = outcome.as_str(), elapsed_secs = secs,
                            "\u{274c} {name} - {outcome} ({secs:.1}s)");
                    }
                }
            }
            WakeEvent::RunInterrupted { remaining } => {
                tracing::warn!(remaining, "run interrupted, {remaining} account(s) not started");
            }
            WakeEvent::RunFinished {
                success,
                failed,
                elapsed,
            } => {
                tracing::info!("{}", "-".repeat(60));
                tracing::info!(
                    success,
                    failed,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "waker run finished: {success} succeeded, {failed} failed"
                );
                tracing::info!("{}", "=".repeat(60));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<WakeEvent>,
}

impl Recorder {
    pub fn finished(&self) -> impl Iterator<Item = (&str, &WakeOutcome)> {
        self.events.iter().filter_map(|e| match e {
            WakeEvent::AccountFinished { name, outcome, .. } => Some((name.as_str(), outcome)),
            _ => None,
        })
    }
}

impl ReportSink for Recorder {
    fn record(&mut self, event: WakeEvent) {
        self.events.push(event);
    }
}
