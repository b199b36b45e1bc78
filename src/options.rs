//! Run configuration and fault expectation matching.

use std::fmt;

use crate::config;
use crate::error::HarnessError;
use crate::fault::ScenarioFault;

/// Matches a raised fault against a run-level expectation.
///
/// Evaluated against the fault descriptor (kind tag + message) only.
/// Assertion-style faults are never swallowed by a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultMatcher {
    /// Matches any raised fault with this exact kind tag.
    ByKind(String),
    /// Matches any raised fault whose message contains this substring.
    ByMessageSubstring(String),
}

impl FaultMatcher {
    pub fn matches(&self, fault: &ScenarioFault) -> bool {
        match fault {
            ScenarioFault::Assertion { .. } => false,
            ScenarioFault::Raised { kind, message } => match self {
                Self::ByKind(expected) => kind == expected,
                Self::ByMessageSubstring(substring) => message.contains(substring),
            },
        }
    }
}

impl fmt::Display for FaultMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByKind(kind) => write!(f, "fault of kind \"{kind}\""),
            Self::ByMessageSubstring(s) => write!(f, "fault message containing \"{s}\""),
        }
    }
}

/// Run configuration. Immutable once the run starts (moved into the runner).
#[derive(Debug, Clone)]
pub struct RunOptions {
    participant_count: usize,
    require_same_result: bool,
    expected_fault: Option<FaultMatcher>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            participant_count: config::default_participant_count(),
            require_same_result: false,
            expected_fault: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of concurrent participants. Must be at least 1.
    pub fn participant_count(mut self, count: usize) -> Self {
        self.participant_count = count;
        self
    }

    /// Require every submitted goal value to be equal at verdict time.
    pub fn require_same_result(mut self) -> Self {
        self.require_same_result = true;
        self
    }

    /// Expect at least one participant to raise a fault matching `matcher`.
    pub fn expect_fault(mut self, matcher: FaultMatcher) -> Self {
        self.expected_fault = Some(matcher);
        self
    }

    /// Shorthand for expecting a fault by kind tag.
    pub fn expect_fault_kind(self, kind: impl Into<String>) -> Self {
        self.expect_fault(FaultMatcher::ByKind(kind.into()))
    }

    /// Shorthand for expecting a fault by message substring.
    pub fn expect_fault_containing(self, substring: impl Into<String>) -> Self {
        self.expect_fault(FaultMatcher::ByMessageSubstring(substring.into()))
    }

    pub fn participants(&self) -> usize {
        self.participant_count
    }

    pub fn same_result_required(&self) -> bool {
        self.require_same_result
    }

    pub fn expected(&self) -> Option<&FaultMatcher> {
        self.expected_fault.as_ref()
    }

    /// Fail fast before any participant starts.
    pub(crate) fn validate(&self) -> Result<(), HarnessError> {
        if self.participant_count < 1 {
            return Err(HarnessError::Usage(format!(
                "participant count must be at least 1, got {}",
                self.participant_count
            )));
        }
        Ok(())
    }
}
