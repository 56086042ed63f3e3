use crate::output::{print_json, print_report};
use anyhow::Context;
use std::path::Path;
use waker_core::{
    ClaudeExecutor, Config, InFlight, Orchestrator, StopHandle, StopSignal, TimeoutPolicy,
    TracingSink, WakeReport,
};

/// Exit status of a run stopped by Ctrl-C (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

pub struct RunArgs {
    pub accounts: Vec<String>,
    pub strict_timeout: bool,
    pub fail_on_error: bool,
}

/// Wake every selected account and print the report. Returns the process
/// exit status.
pub fn run(config_path: &Path, args: RunArgs, json: bool) -> anyhow::Result<i32> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let warnings = config.check().context("config validation failed")?;
    for w in &warnings {
        tracing::warn!("config: {}", w.message);
    }

    let accounts = config.select_accounts(&args.accounts)?;

    let mut settings = config.executor_settings();
    if args.strict_timeout {
        settings.timeout_policy = TimeoutPolicy::Strict;
    }
    let executor = ClaudeExecutor::new(settings);

    let (handle, signal) = StopSignal::channel();
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        tokio::spawn(watch_interrupts(handle, executor.in_flight()));
        Orchestrator::new(&executor, config.run_settings())
            .with_placeholders(config.placeholders())
            .with_stop_signal(signal)
            .run(&accounts, &mut TracingSink)
            .await
    });

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    Ok(exit_code(&report, args.fail_on_error))
}

/// First Ctrl-C lets the in-flight attempt finish and skips the rest;
/// a second one kills that attempt's process group and exits immediately.
async fn watch_interrupts(handle: StopHandle, in_flight: InFlight) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    tracing::warn!("interrupt received; finishing the current account (Ctrl-C again to abort)");
    handle.stop();

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::error!("aborted");
        in_flight.kill();
        std::process::exit(EXIT_INTERRUPTED);
    }
}

fn exit_code(report: &WakeReport, fail_on_error: bool) -> i32 {
    if report.interrupted {
        EXIT_INTERRUPTED
    } else if fail_on_error && report.fail_count > 0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waker_core::WakeOutcome;

    fn report(outcomes: &[WakeOutcome]) -> WakeReport {
        let mut r = WakeReport::default();
        for (i, o) in outcomes.iter().enumerate() {
            r.record(format!("acct-{i}"), o.clone());
        }
        r
    }

    #[test]
    fn failures_only_fail_the_process_when_asked() {
        let r = report(&[WakeOutcome::Success, WakeOutcome::NotConfigured]);
        assert_eq!(exit_code(&r, false), 0);
        assert_eq!(exit_code(&r, true), 1);
    }

    #[test]
    fn soft_success_is_not_a_failure() {
        let r = report(&[WakeOutcome::TimeoutSent]);
        assert_eq!(exit_code(&r, true), 0);
    }

    #[test]
    fn interruption_wins() {
        let mut r = report(&[WakeOutcome::failure("boom")]);
        r.interrupted = true;
        assert_eq!(exit_code(&r, false), EXIT_INTERRUPTED);
        assert_eq!(exit_code(&r, true), EXIT_INTERRUPTED);
    }
}
