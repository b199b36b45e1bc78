//! Fault descriptors raised by scenario code.
//!
//! Scenario bodies report failures as values, not by downcasting runtime
//! types: a fault is either an assertion-style check that failed, or an
//! arbitrary raised error carrying a kind tag plus a message. Expectation
//! matching in [`crate::options::FaultMatcher`] works purely on this
//! descriptor.

use std::fmt;

/// Result type for scenario bodies and project plans.
pub type DriveResult = Result<(), ScenarioFault>;

/// Kind tag reserved for harness misuse detected mid-scenario.
pub(crate) const USAGE_KIND: &str = "usage";

/// A failure raised from inside a scenario or project body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioFault {
    /// A scenario-level check failed (explicit check helpers, a panic in the
    /// body, or a watchdog expectation violation).
    Assertion { message: String },
    /// Any other error raised by scenario code, described by a kind tag and
    /// a message.
    Raised { kind: String, message: String },
}

impl ScenarioFault {
    /// Build an assertion-style fault.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion { message: message.into() }
    }

    /// Build a raised fault with a kind tag.
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised { kind: kind.into(), message: message.into() }
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::raised(USAGE_KIND, message)
    }

    /// True for assertion-style faults.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion { .. })
    }

    pub(crate) fn is_usage(&self) -> bool {
        matches!(self, Self::Raised { kind, .. } if kind == USAGE_KIND)
    }

    /// The kind tag, if this is a raised fault.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Assertion { .. } => None,
            Self::Raised { kind, .. } => Some(kind),
        }
    }

    /// The fault message.
    pub fn message(&self) -> &str {
        match self {
            Self::Assertion { message } | Self::Raised { message, .. } => message,
        }
    }
}

impl fmt::Display for ScenarioFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assertion { message } => write!(f, "assertion failed: {message}"),
            Self::Raised { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

/// Fail the scenario unless `condition` holds.
pub fn check(condition: bool, message: impl Into<String>) -> DriveResult {
    if condition {
        Ok(())
    } else {
        Err(ScenarioFault::assertion(message))
    }
}

/// Fail the scenario unless `expected == actual`.
pub fn check_eq<T: PartialEq + fmt::Debug>(expected: T, actual: T) -> DriveResult {
    if expected == actual {
        Ok(())
    } else {
        Err(ScenarioFault::assertion(format!(
            "expected {expected:?} but was {actual:?}"
        )))
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "participant panicked".to_string()
    }
}
