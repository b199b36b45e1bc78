//! Verdict classification tests, driven against the ledger directly so every
//! case is deterministic.

use super::*;
use crate::options::FaultMatcher;

fn matcher_containing(substring: &str) -> RunOptions {
    RunOptions::new()
        .participant_count(2)
        .expect_fault(FaultMatcher::ByMessageSubstring(substring.into()))
}

#[test]
fn clean_ledger_passes() {
    let ledger = OutcomeLedger::new();
    let options = RunOptions::new().participant_count(2);
    assert!(compute_verdict(&options, &ledger).is_ok());
}

#[test]
fn usage_fault_wins_over_everything() {
    let ledger = OutcomeLedger::new();
    ledger.record_fault(2, ScenarioFault::assertion("late"));
    ledger.record_fault(1, ScenarioFault::usage("double expectation"));
    let verdict = compute_verdict(&matcher_containing("double"), &ledger);
    assert!(matches!(verdict, Err(HarnessError::Usage(_))));
}

#[test]
fn assertion_propagates_with_entry_number() {
    let ledger = OutcomeLedger::new();
    ledger.record_fault(3, ScenarioFault::assertion("boom"));
    let options = RunOptions::new().participant_count(5);
    let Err(HarnessError::AssertionViolation(message)) = compute_verdict(&options, &ledger)
    else {
        panic!("expected an assertion violation");
    };
    assert!(message.contains("participant 3"));
    assert!(message.contains("boom"));
}

#[test]
fn assertion_short_circuits_a_configured_matcher() {
    let ledger = OutcomeLedger::new();
    ledger.record_fault(1, ScenarioFault::raised("state", "foo"));
    ledger.record_fault(2, ScenarioFault::assertion("second"));
    let verdict = compute_verdict(&matcher_containing("foo"), &ledger);
    assert!(matches!(verdict, Err(HarnessError::AssertionViolation(_))));
}

#[test]
fn unexpected_faults_aggregate_every_participant() {
    let ledger = OutcomeLedger::new();
    ledger.record_fault(1, ScenarioFault::raised("state", "foo\nbar"));
    ledger.record_fault(3, ScenarioFault::raised("state", "qux"));
    let options = RunOptions::new().participant_count(3);
    let Err(HarnessError::UnexpectedParticipantFailure(roster)) =
        compute_verdict(&options, &ledger)
    else {
        panic!("expected aggregated failures");
    };
    assert_eq!(roster.0.len(), 2);
    assert_eq!(roster.0[0].entry_number, 1);
    assert_eq!(roster.0[1].entry_number, 3);
}

#[test]
fn one_match_swallows_non_matching_raised_faults() {
    let ledger = OutcomeLedger::new();
    ledger.record_fault(1, ScenarioFault::raised("state", "foo"));
    ledger.record_fault(2, ScenarioFault::raised("state", "second"));
    ledger.record_fault(3, ScenarioFault::raised("state", "second"));
    assert!(compute_verdict(&matcher_containing("foo"), &ledger).is_ok());
}

#[test]
fn missing_expected_fault_reports_what_was_observed() {
    let ledger = OutcomeLedger::new();
    ledger.record_fault(1, ScenarioFault::raised("state", "foo"));
    let Err(HarnessError::AssertionViolation(message)) =
        compute_verdict(&matcher_containing("qux"), &ledger)
    else {
        panic!("expected an assertion violation");
    };
    assert!(message.contains("qux"));
    assert!(message.contains("participant 1"));
    assert!(message.contains("foo"));
}

#[test]
fn missing_expected_fault_with_clean_run_says_so() {
    let ledger = OutcomeLedger::new();
    let Err(HarnessError::AssertionViolation(message)) =
        compute_verdict(&matcher_containing("qux"), &ledger)
    else {
        panic!("expected an assertion violation");
    };
    assert!(message.contains("no faults"));
}

#[test]
fn divergent_goals_name_both_values() {
    let ledger = OutcomeLedger::new();
    ledger.record_goal(1, "A");
    ledger.record_goal(2, "B");
    let options = RunOptions::new().participant_count(2).require_same_result();
    let Err(HarnessError::AssertionViolation(message)) = compute_verdict(&options, &ledger)
    else {
        panic!("expected an assertion violation");
    };
    assert!(message.contains("\"A\""));
    assert!(message.contains("\"B\""));
}

#[test]
fn identical_goals_pass_with_aborted_participants_excluded() {
    let ledger = OutcomeLedger::new();
    ledger.record_goal(1, "A");
    ledger.record_goal(2, "A");
    // Participant 3 aborted with a matching fault before reaching a goal.
    ledger.record_fault(3, ScenarioFault::raised("state", "foo"));
    let options = matcher_containing("foo").require_same_result();
    assert!(compute_verdict(&options, &ledger).is_ok());
}

#[test]
fn end_to_end_closure_scenario() {
    let verdict = Runner::default().run(
        |participant: &Participant| -> DriveResult {
            participant.submit_goal("A");
            Ok(())
        },
        RunOptions::new().participant_count(4).require_same_result(),
    );
    assert!(verdict.is_ok());
}
