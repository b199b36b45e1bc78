//! Injected support capabilities and logging initialization.
//!
//! The harness never inherits test-framework behavior; it calls into a
//! [`RunSupport`] capability for the per-test context lifecycle and for
//! diagnostic logging. The default implementation is tracing-backed.

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Capabilities the harness calls into around a run.
///
/// All methods have no-op or tracing-backed defaults; implement them to hook
/// the harness into a host test framework's transactional context.
pub trait RunSupport: Send + Sync {
    /// Invoked once before any participant starts.
    fn prepare_context(&self) {}

    /// Invoked once after every participant and project body has settled,
    /// before the verdict is raised.
    fn clear_context(&self) {}

    /// Diagnostic logging. No behavioral contract.
    fn log(&self, message: &str) {
        tracing::info!(target: "stampede", "{message}");
    }
}

/// Default support: no context lifecycle, logs through `tracing`.
pub struct TracingSupport;

impl RunSupport for TracingSupport {}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging.
    Json,
    /// Human-readable pretty printing (default for test runs).
    #[default]
    Pretty,
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

/// Initialize the tracing subscriber for test output.
///
/// Opt-in; call once from a test binary that wants harness diagnostics.
/// `level` follows `EnvFilter` syntax (e.g. "info", "stampede=debug").
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(level).map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized),
    }
}
