//! Wake orchestrator: walks the account list one account at a time.
//!
//! Attempts never overlap. Each one finishes (or is killed by the executor's
//! outer timeout) before the next account starts, with a fixed pause in
//! between so the remote side never sees a burst of wake requests.

use crate::account::{AccountSpec, Placeholders};
use crate::executor::WakeExecutor;
use crate::outcome::{WakeOutcome, WakeReport};
use crate::sink::{ReportSink, WakeEvent};
use crate::stop::StopSignal;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub per_attempt_timeout: Duration,
    /// Pause between two consecutive accounts. Not applied after the last.
    pub inter_attempt_delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            per_attempt_timeout: Duration::from_secs(60),
            inter_attempt_delay: Duration::from_secs(2),
        }
    }
}

pub struct Orchestrator<'a, E: WakeExecutor + ?Sized> {
    executor: &'a E,
    settings: RunSettings,
    placeholders: Placeholders,
    stop: Option<StopSignal>,
}

impl<'a, E: WakeExecutor + ?Sized> Orchestrator<'a, E> {
    pub fn new(executor: &'a E, settings: RunSettings) -> Self {
        Self {
            executor,
            settings,
            placeholders: Placeholders::default(),
            stop: None,
        }
    }

    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Stop before the next account once `stop` is raised. The attempt in
    /// flight at that moment is left to finish on its own.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Wake every account in order and return the aggregate report.
    ///
    /// Per-account problems end up in the report; nothing here fails the run.
    pub async fn run(&self, accounts: &[AccountSpec], sink: &mut dyn ReportSink) -> WakeReport {
        let run_started = Instant::now();
        let mut stop = self.stop.clone();
        let mut report = WakeReport::default();
        let total = accounts.len();

        sink.record(WakeEvent::RunStarted { accounts: total });

        for (idx, account) in accounts.iter().enumerate() {
            if stop.as_ref().is_some_and(StopSignal::is_raised) {
                report.interrupted = true;
                sink.record(WakeEvent::RunInterrupted {
                    remaining: total - idx,
                });
                break;
            }

            let started = Instant::now();
            let outcome = if self.placeholders.is_placeholder(&account.credential) {
                WakeOutcome::NotConfigured
            } else {
                sink.record(WakeEvent::AttemptStarted {
                    index: idx,
                    total,
                    name: account.name.clone(),
                });
                self.executor
                    .attempt_wake(&account.credential, self.settings.per_attempt_timeout)
                    .await
            };

            sink.record(WakeEvent::AccountFinished {
                name: account.name.clone(),
                outcome: outcome.clone(),
                elapsed: started.elapsed(),
            });
            report.record(account.name.clone(), outcome);

            if idx + 1 < total {
                self.pause(stop.as_mut()).await;
            }
        }

        sink.record(WakeEvent::RunFinished {
            success: report.success_count,
            failed: report.fail_count,
            elapsed: run_started.elapsed(),
        });
        report
    }

    async fn pause(&self, stop: Option<&mut StopSignal>) {
        let delay = self.settings.inter_attempt_delay;
        match stop {
            Some(signal) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = signal.raised() => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
