//! Per-run aggregation of goals and faults.
//!
//! Uses parking_lot::Mutex for fast synchronous locking. Participants and
//! their background project bodies write concurrently; the runner reads only
//! after everything has settled.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::fault::ScenarioFault;

/// One recorded fault with the entry number it is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub entry_number: usize,
    pub fault: ScenarioFault,
}

/// Collects (entry number → goal) and raised faults as participants finish.
#[derive(Default)]
pub struct OutcomeLedger {
    goals: Mutex<BTreeMap<usize, String>>,
    faults: Mutex<Vec<FaultRecord>>,
}

impl OutcomeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a participant's goal. A later submission in the same pass
    /// overwrites the earlier one.
    pub fn record_goal(&self, entry_number: usize, value: impl Into<String>) {
        self.goals.lock().insert(entry_number, value.into());
    }

    /// Record a fault attributed to `entry_number`. A participant and its
    /// released project bodies may each contribute one.
    pub fn record_fault(&self, entry_number: usize, fault: ScenarioFault) {
        self.faults.lock().push(FaultRecord { entry_number, fault });
    }

    /// Snapshot of submitted goals, keyed by entry number.
    pub fn goals(&self) -> BTreeMap<usize, String> {
        self.goals.lock().clone()
    }

    /// Snapshot of recorded faults, sorted by entry number for deterministic
    /// classification.
    pub fn faults(&self) -> Vec<FaultRecord> {
        let mut faults = self.faults.lock().clone();
        faults.sort_by_key(|record| record.entry_number);
        faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_resubmission_overwrites() {
        let ledger = OutcomeLedger::new();
        ledger.record_goal(2, "A");
        ledger.record_goal(2, "B");
        assert_eq!(ledger.goals().get(&2).map(String::as_str), Some("B"));
    }

    #[test]
    fn faults_sorted_by_entry_number() {
        let ledger = OutcomeLedger::new();
        ledger.record_fault(5, ScenarioFault::raised("io", "late"));
        ledger.record_fault(1, ScenarioFault::assertion("early"));
        let faults = ledger.faults();
        assert_eq!(faults[0].entry_number, 1);
        assert_eq!(faults[1].entry_number, 5);
    }

    #[test]
    fn absent_goal_is_valid() {
        let ledger = OutcomeLedger::new();
        ledger.record_goal(1, "A");
        assert!(ledger.goals().get(&2).is_none());
    }
}
