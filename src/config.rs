//! Harness defaults loaded from environment variables.
//!
//! All values are loaded from `STAMPEDE_*` environment variables with
//! sensible defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `STAMPEDE_PARTICIPANTS` | 10 | Default participant count per run |
//! | `STAMPEDE_RELEASE_WINDOW_MS` | 3000 | Watchdog release window when an expectation is declared without an explicit one (ms) |

use std::time::Duration;

/// Default participant count when [`crate::options::RunOptions`] does not set one.
pub const DEFAULT_PARTICIPANTS: usize = 10;

/// Default watchdog release window.
pub const DEFAULT_RELEASE_WINDOW: Duration = Duration::from_millis(3000);

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Default participant count for a run. Floor: 1.
pub fn default_participant_count() -> usize {
    parse_usize("STAMPEDE_PARTICIPANTS", DEFAULT_PARTICIPANTS).max(1)
}

/// Release window applied when a watchdog expectation is declared without an
/// explicit `release_if_overtime`. Floor: 1ms.
pub fn default_release_window() -> Duration {
    let millis = parse_u64(
        "STAMPEDE_RELEASE_WINDOW_MS",
        DEFAULT_RELEASE_WINDOW.as_millis() as u64,
    )
    .max(1);
    Duration::from_millis(millis)
}
