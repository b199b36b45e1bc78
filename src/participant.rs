//! One logical worker with a stable ordinal identity.
//!
//! A participant executes the scenario body once on its own thread. The
//! handle is cheap to clone so project bodies can capture it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::barrier::RestartBarrier;
use crate::fault::{DriveResult, ScenarioFault};
use crate::ledger::OutcomeLedger;
use crate::project::{self, LaunchContext, ProjectRegistry, Watchdog};

/// Lifecycle state of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    Running,
    AwaitingRestart,
    Done,
    Aborted,
}

/// Handle passed to [`crate::Scenario::drive`], one per worker.
#[derive(Clone)]
pub struct Participant {
    entry_number: usize,
    total: usize,
    state: Arc<Mutex<ParticipantState>>,
    barrier: Arc<RestartBarrier>,
    ledger: Arc<OutcomeLedger>,
    projects: Arc<ProjectRegistry>,
    active_projects: Arc<AtomicUsize>,
    release_window: Duration,
}

impl Participant {
    pub(crate) fn new(
        entry_number: usize,
        total: usize,
        barrier: Arc<RestartBarrier>,
        ledger: Arc<OutcomeLedger>,
        projects: Arc<ProjectRegistry>,
        release_window: Duration,
    ) -> Self {
        Self {
            entry_number,
            total,
            state: Arc::new(Mutex::new(ParticipantState::Running)),
            barrier,
            ledger,
            projects,
            active_projects: Arc::new(AtomicUsize::new(0)),
            release_window,
        }
    }

    /// Stable ordinal identity in `1..=participant_count`.
    pub fn entry_number(&self) -> usize {
        self.entry_number
    }

    /// Size of the cohort this participant belongs to.
    pub fn participant_count(&self) -> usize {
        self.total
    }

    /// Whether this participant holds the given entry number. Asking about a
    /// number beyond the cohort is an error.
    pub fn is_entry_number(&self, number: usize) -> Result<bool, ScenarioFault> {
        if number < 1 || number > self.total {
            return Err(ScenarioFault::raised(
                "entry-number",
                format!(
                    "entry number {number} is over count; the cohort is 1..={}",
                    self.total
                ),
            ));
        }
        Ok(self.entry_number == number)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ParticipantState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: ParticipantState) {
        *self.state.lock() = state;
    }

    /// Projects launched by this participant whose bodies are still running.
    pub fn active_project_count(&self) -> usize {
        self.active_projects.load(Ordering::SeqCst)
    }

    /// Submit this participant's result value for the run.
    pub fn submit_goal(&self, value: impl Into<String>) {
        let value = value.into();
        tracing::debug!(entry_number = self.entry_number, goal = %value, "goal submitted");
        self.ledger.record_goal(self.entry_number, value);
    }

    /// Block until every other active participant has also called `restart`,
    /// then continue. Code after this call never executes for any participant
    /// before all of them have reached it.
    pub fn restart(&self) {
        self.set_state(ParticipantState::AwaitingRestart);
        self.barrier.wait();
        self.set_state(ParticipantState::Running);
    }

    /// Launch a sub-task on its own worker thread and wait for it under the
    /// policy its body declares on the [`Watchdog`].
    pub fn launch_project<B>(&self, order_key: i64, body: B) -> DriveResult
    where
        B: FnOnce(&Watchdog) -> DriveResult + Send + 'static,
    {
        tracing::debug!(
            entry_number = self.entry_number,
            order_key,
            "launching project"
        );
        project::launch(
            LaunchContext {
                entry_number: self.entry_number,
                order_key,
                ledger: Arc::clone(&self.ledger),
                registry: Arc::clone(&self.projects),
                active_projects: Arc::clone(&self.active_projects),
                default_window: self.release_window,
            },
            body,
        )
    }

    pub(crate) fn retire_from_barrier(&self) {
        self.barrier.retire();
    }
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("entry_number", &self.entry_number)
            .field("total", &self.total)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lone_participant() -> Participant {
        Participant::new(
            1,
            2,
            Arc::new(RestartBarrier::new(2)),
            Arc::new(OutcomeLedger::new()),
            Arc::new(ProjectRegistry::new()),
            Duration::from_secs(3),
        )
    }

    #[test]
    fn entry_number_predicate() {
        let participant = lone_participant();
        assert_eq!(participant.is_entry_number(1), Ok(true));
        assert_eq!(participant.is_entry_number(2), Ok(false));
    }

    #[test]
    fn over_count_entry_number_is_an_error() {
        let participant = lone_participant();
        let fault = participant.is_entry_number(99999).unwrap_err();
        assert!(fault.message().contains("over count"));
    }

    #[test]
    fn zero_entry_number_is_an_error() {
        let participant = lone_participant();
        assert!(participant.is_entry_number(0).is_err());
    }

    #[test]
    fn starts_running() {
        assert_eq!(lone_participant().state(), ParticipantState::Running);
    }
}
