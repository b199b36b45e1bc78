//! Harness runner: owns the participant pool, the final join, and the verdict.
//!
//! One OS thread per participant, each driving the scenario exactly once.
//! The verdict is computed only after every participant has reached a
//! terminal state and every project body (including released ones) has
//! finished, so no result or fault is read while still possibly being
//! written.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crate::barrier::RestartBarrier;
use crate::config;
use crate::error::{FailureRoster, HarnessError, ParticipantFailure};
use crate::fault::{panic_message, DriveResult, ScenarioFault};
use crate::ledger::{FaultRecord, OutcomeLedger};
use crate::options::RunOptions;
use crate::participant::{Participant, ParticipantState};
use crate::project::ProjectRegistry;
use crate::support::{RunSupport, TracingSupport};

/// User-supplied test logic, invoked once per participant.
pub trait Scenario: Send + Sync + 'static {
    fn drive(&self, participant: &Participant) -> DriveResult;
}

impl<F> Scenario for F
where
    F: Fn(&Participant) -> DriveResult + Send + Sync + 'static,
{
    fn drive(&self, participant: &Participant) -> DriveResult {
        self(participant)
    }
}

/// Runs scenarios against an injected support capability.
pub struct Runner {
    support: Arc<dyn RunSupport>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Arc::new(TracingSupport))
    }
}

impl Runner {
    pub fn new(support: Arc<dyn RunSupport>) -> Self {
        Self { support }
    }

    /// Run `scenario` across `options.participants()` concurrent workers and
    /// raise the run's verdict.
    pub fn run<S: Scenario>(&self, scenario: S, options: RunOptions) -> Result<(), HarnessError> {
        options.validate()?;
        let participants = options.participants();
        self.support.prepare_context();
        tracing::info!(participants, "scenario run starting");

        let barrier = Arc::new(RestartBarrier::new(participants));
        let ledger = Arc::new(OutcomeLedger::new());
        let registry = Arc::new(ProjectRegistry::new());
        let release_window = config::default_release_window();
        let scenario = Arc::new(scenario);

        let mut workers = Vec::with_capacity(participants);
        for entry_number in 1..=participants {
            let participant = Participant::new(
                entry_number,
                participants,
                Arc::clone(&barrier),
                Arc::clone(&ledger),
                Arc::clone(&registry),
                release_window,
            );
            let scenario = Arc::clone(&scenario);
            let ledger = Arc::clone(&ledger);
            let handle = thread::Builder::new()
                .name(format!("participant-{entry_number}"))
                .spawn(move || drive_participant(scenario.as_ref(), &participant, &ledger))
                .expect("Failed to spawn participant thread");
            workers.push(handle);
        }
        for handle in workers {
            let _ = handle.join();
        }
        // Released project bodies settle before any verdict is computed.
        registry.join_all();
        self.support.clear_context();

        let verdict = compute_verdict(&options, &ledger);
        match &verdict {
            Ok(()) => tracing::info!(participants, "scenario run passed"),
            Err(error) => tracing::info!(participants, %error, "scenario run failed"),
        }
        verdict
    }
}

fn drive_participant<S: Scenario>(
    scenario: &S,
    participant: &Participant,
    ledger: &OutcomeLedger,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| scenario.drive(participant)))
        .unwrap_or_else(|payload| Err(ScenarioFault::assertion(panic_message(payload))));
    match outcome {
        Ok(()) => participant.set_state(ParticipantState::Done),
        Err(fault) => {
            tracing::debug!(
                entry_number = participant.entry_number(),
                %fault,
                "participant aborted"
            );
            ledger.record_fault(participant.entry_number(), fault);
            participant.set_state(ParticipantState::Aborted);
        }
    }
    // Terminal participants leave the rendezvous so stragglers cannot block
    // on a party that will never arrive.
    participant.retire_from_barrier();
}

fn compute_verdict(options: &RunOptions, ledger: &OutcomeLedger) -> Result<(), HarnessError> {
    let faults = ledger.faults();
    if let Some(record) = faults.iter().find(|record| record.fault.is_usage()) {
        return Err(HarnessError::Usage(record.fault.message().to_string()));
    }
    if let Some(record) = faults.iter().find(|record| record.fault.is_assertion()) {
        return Err(HarnessError::AssertionViolation(format!(
            "participant {}: {}",
            record.entry_number,
            record.fault.message()
        )));
    }
    match options.expected() {
        Some(matcher) => {
            // At least one match makes the run pass; the rest are tolerated.
            if !faults.iter().any(|record| matcher.matches(&record.fault)) {
                return Err(HarnessError::AssertionViolation(format!(
                    "expected {matcher} was never raised; observed: {}",
                    describe_faults(&faults)
                )));
            }
        }
        None => {
            if !faults.is_empty() {
                let roster = faults
                    .iter()
                    .map(|record| ParticipantFailure {
                        entry_number: record.entry_number,
                        description: record.fault.to_string(),
                    })
                    .collect();
                return Err(HarnessError::UnexpectedParticipantFailure(FailureRoster(
                    roster,
                )));
            }
        }
    }
    if options.same_result_required() {
        check_same_goal(ledger)?;
    }
    Ok(())
}

fn check_same_goal(ledger: &OutcomeLedger) -> Result<(), HarnessError> {
    let goals = ledger.goals();
    let distinct: BTreeSet<&String> = goals.values().collect();
    if distinct.len() > 1 {
        let listing = goals
            .iter()
            .map(|(entry, value)| format!("participant {entry} -> \"{value}\""))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(HarnessError::AssertionViolation(format!(
            "participants reached different goals: {listing}"
        )));
    }
    Ok(())
}

fn describe_faults(faults: &[FaultRecord]) -> String {
    if faults.is_empty() {
        return "no faults".to_string();
    }
    faults
        .iter()
        .map(|record| format!("participant {}: {}", record.entry_number, record.fault))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
