//! Core of `waker`: wakes a list of Claude accounts one at a time so each
//! account's usage window starts at a predictable hour.
//!
//! [`Orchestrator`] walks the accounts, [`ClaudeExecutor`] runs one isolated
//! `claude` subprocess per account, and every step is reported through a
//! [`ReportSink`].

pub mod account;
pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod outcome;
pub mod sink;
pub mod stop;

pub use account::{AccountSpec, Credential, Placeholders};
pub use config::Config;
pub use error::{Result, WakerError};
pub use executor::{ClaudeExecutor, ExecutorSettings, InFlight, TimeoutPolicy, WakeExecutor};
pub use orchestrator::{Orchestrator, RunSettings};
pub use outcome::{AccountOutcome, WakeOutcome, WakeReport};
pub use sink::{Recorder, ReportSink, TracingSink, WakeEvent};
pub use stop::{StopHandle, StopSignal};
