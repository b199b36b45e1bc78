//! Harness error taxonomy.
//!
//! Exactly one error (or none) is returned from a run. The three variants let
//! callers tell "an assertion check failed" apart from "a real bug fired in a
//! participant" and from "the harness was misconfigured".

use std::fmt;

use thiserror::Error;

/// Errors returned by [`crate::runner::Runner::run`].
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A scenario-level check failed: goal divergence, a watchdog expectation
    /// violation, an expected fault that never showed up, or a plain
    /// assertion raised inside a participant.
    #[error("assertion violated: {0}")]
    AssertionViolation(String),

    /// One or more participants raised a non-assertion fault with no matching
    /// expectation configured.
    #[error("run aborted by unexpected participant failure(s): {0}")]
    UnexpectedParticipantFailure(FailureRoster),

    /// Invalid configuration or harness misuse.
    #[error("invalid harness usage: {0}")]
    Usage(String),
}

/// One participant's contribution to an aggregated failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantFailure {
    pub entry_number: usize,
    pub description: String,
}

/// Every offending participant and cause, in entry-number order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRoster(pub Vec<ParticipantFailure>);

impl fmt::Display for FailureRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "participant {}: {}", failure.entry_number, failure.description)?;
        }
        Ok(())
    }
}
