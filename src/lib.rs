//! Stampede — concurrent scenario harness for tests.
//!
//! Runs a user-supplied scenario simultaneously across N synthetic
//! participants to flush out race conditions, verify non-determinism bounds,
//! and assert timing-dependent outcomes (normal completion vs. legitimate
//! overtime).
//!
//! # Model
//!
//! - **Participant**: one worker with a stable entry number in `1..=N`,
//!   executing the scenario once on its own OS thread.
//! - **Restart barrier**: [`Participant::restart`] is a reusable N-party
//!   rendezvous, the mechanism that lets a test assert "all N have done X"
//!   before any does Y.
//! - **Project**: an optionally-asynchronous sub-task launched mid-scenario,
//!   governed by a [`Watchdog`] that decides whether the launcher blocks for
//!   completion, tolerates overtime, or is released early.
//! - **Verdict**: after every participant and project body settles, goals and
//!   faults are classified into exactly one [`HarnessError`] or a pass.
//!
//! # Example
//!
//! ```no_run
//! use stampede::{run_scenario, RunOptions};
//!
//! let verdict = run_scenario(
//!     |participant: &stampede::Participant| -> stampede::DriveResult {
//!         participant.submit_goal("A");
//!         Ok(())
//!     },
//!     RunOptions::new().require_same_result(),
//! );
//! assert!(verdict.is_ok());
//! ```
//!
//! The harness is in-process and single-run: it owns no state between
//! invocations and performs no distributed coordination.

pub mod barrier;
pub mod config;
pub mod error;
pub mod fault;
pub mod ledger;
pub mod options;
pub mod participant;
pub mod project;
pub mod runner;
pub mod support;

pub use error::{FailureRoster, HarnessError, ParticipantFailure};
pub use fault::{check, check_eq, DriveResult, ScenarioFault};
pub use ledger::OutcomeLedger;
pub use options::{FaultMatcher, RunOptions};
pub use participant::{Participant, ParticipantState};
pub use project::Watchdog;
pub use runner::{Runner, Scenario};
pub use support::{init_logging, LogFormat, RunSupport, TracingSupport};

/// Run `scenario` across the configured participant count with the default
/// support capability. Returns the run's verdict.
pub fn run_scenario<S: Scenario>(
    scenario: S,
    options: RunOptions,
) -> Result<(), HarnessError> {
    Runner::default().run(scenario, options)
}
