//! Optionally-asynchronous sub-tasks launched mid-scenario, governed by a
//! per-project watchdog.
//!
//! A project body always runs on its own worker thread. With no watchdog
//! calls the launcher blocks until the body completes, equivalent to a direct
//! call. Declaring an expectation or a release window arms the watchdog: the
//! launcher's wait becomes bounded, and when the window elapses first the
//! launcher is released while the body keeps running in the background. The
//! runner's final join gathers every body, released or not, so no background
//! work leaks past the run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::fault::{panic_message, DriveResult, ScenarioFault};
use crate::ledger::OutcomeLedger;

/// Declared resolution expectation for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    None,
    NormallyDone,
    Overtime,
}

struct WatchInner {
    expectation: Expectation,
    release_after: Option<Duration>,
    finished: bool,
    /// Body outcome, handed to the launcher on natural completion.
    outcome: Option<DriveResult>,
    /// Set once the launcher has been released as overtime; from then on the
    /// body reports its own faults straight to the ledger.
    launcher_released: bool,
}

struct WatchShared {
    started: Instant,
    inner: Mutex<WatchInner>,
    condvar: Condvar,
}

/// Per-project policy handle passed to the body.
///
/// At most one expectation may be declared per project; a second declaration
/// is a usage error.
pub struct Watchdog {
    shared: Arc<WatchShared>,
}

impl Watchdog {
    /// Declare that the project must complete of its own accord before the
    /// launcher's wait resolves.
    pub fn expect_normally_done(&self) -> DriveResult {
        self.declare(Expectation::NormallyDone)
    }

    /// Declare that the project is expected to still be running when the
    /// launcher's wait resolves.
    pub fn expect_overtime(&self) -> DriveResult {
        self.declare(Expectation::Overtime)
    }

    fn declare(&self, expectation: Expectation) -> DriveResult {
        let mut inner = self.shared.inner.lock();
        if inner.expectation != Expectation::None {
            return Err(ScenarioFault::usage(
                "a watchdog expectation was already declared for this project",
            ));
        }
        inner.expectation = expectation;
        drop(inner);
        self.shared.condvar.notify_all();
        Ok(())
    }

    /// Bound the launcher's wait to `window` from project start. Once elapsed
    /// without natural completion, the launcher continues its own scenario
    /// while the body keeps running in the background.
    pub fn release_if_overtime(&self, window: Duration) {
        let mut inner = self.shared.inner.lock();
        inner.release_after = Some(window);
        drop(inner);
        self.shared.condvar.notify_all();
    }
}

/// Join handles for every spawned project body in a run.
#[derive(Default)]
pub(crate) struct ProjectRegistry {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ProjectRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().push(handle);
    }

    /// Block until every spawned body has finished, released ones included.
    pub(crate) fn join_all(&self) {
        loop {
            let Some(handle) = self.handles.lock().pop() else {
                return;
            };
            let _ = handle.join();
        }
    }
}

/// Everything a launch needs from its participant.
pub(crate) struct LaunchContext {
    pub entry_number: usize,
    pub order_key: i64,
    pub ledger: Arc<OutcomeLedger>,
    pub registry: Arc<ProjectRegistry>,
    pub active_projects: Arc<AtomicUsize>,
    pub default_window: Duration,
}

/// Run `body` on a worker thread and wait for it under watchdog policy.
///
/// Returns the body's own fault on natural completion, an assertion fault on
/// an expectation violation, and `Ok(())` otherwise.
pub(crate) fn launch<B>(ctx: LaunchContext, body: B) -> DriveResult
where
    B: FnOnce(&Watchdog) -> DriveResult + Send + 'static,
{
    let shared = Arc::new(WatchShared {
        started: Instant::now(),
        inner: Mutex::new(WatchInner {
            expectation: Expectation::None,
            release_after: None,
            finished: false,
            outcome: None,
            launcher_released: false,
        }),
        condvar: Condvar::new(),
    });

    ctx.active_projects.fetch_add(1, Ordering::SeqCst);
    let handle = {
        let shared = Arc::clone(&shared);
        let ledger = Arc::clone(&ctx.ledger);
        let active_projects = Arc::clone(&ctx.active_projects);
        let entry_number = ctx.entry_number;
        let order_key = ctx.order_key;
        thread::Builder::new()
            .name(format!("project-{entry_number}-{order_key}"))
            .spawn(move || {
                let watchdog = Watchdog { shared: Arc::clone(&shared) };
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&watchdog)))
                    .unwrap_or_else(|payload| {
                        Err(ScenarioFault::assertion(panic_message(payload)))
                    });
                let mut inner = shared.inner.lock();
                inner.finished = true;
                if inner.launcher_released {
                    // The launcher moved on; faults can only reach the
                    // verdict through the ledger now.
                    if let Err(fault) = outcome {
                        tracing::debug!(
                            entry_number,
                            order_key,
                            %fault,
                            "released project body faulted"
                        );
                        ledger.record_fault(entry_number, fault);
                    }
                } else {
                    inner.outcome = Some(outcome);
                }
                drop(inner);
                active_projects.fetch_sub(1, Ordering::SeqCst);
                shared.condvar.notify_all();
            })
            .expect("Failed to spawn project thread")
    };
    ctx.registry.register(handle);

    wait_for_resolution(&shared, &ctx)
}

fn wait_for_resolution(shared: &WatchShared, ctx: &LaunchContext) -> DriveResult {
    let mut inner = shared.inner.lock();
    loop {
        if inner.finished {
            let outcome = inner.outcome.take().unwrap_or(Ok(()));
            let expectation = inner.expectation;
            drop(inner);
            return resolve_completed(outcome, expectation, ctx);
        }
        match watch_deadline(&inner, shared.started, ctx.default_window) {
            None => shared.condvar.wait(&mut inner),
            Some(deadline) => {
                if Instant::now() >= deadline {
                    inner.launcher_released = true;
                    let expectation = inner.expectation;
                    drop(inner);
                    tracing::debug!(
                        entry_number = ctx.entry_number,
                        order_key = ctx.order_key,
                        "project released as overtime"
                    );
                    return resolve_released(expectation, ctx);
                }
                let _ = shared.condvar.wait_until(&mut inner, deadline);
            }
        }
    }
}

/// The launcher's wait is unbounded until the body arms the watchdog; an
/// expectation without an explicit window falls back to the default one.
fn watch_deadline(
    inner: &WatchInner,
    started: Instant,
    default_window: Duration,
) -> Option<Instant> {
    if let Some(window) = inner.release_after {
        return Some(started + window);
    }
    if inner.expectation != Expectation::None {
        return Some(started + default_window);
    }
    None
}

fn resolve_completed(
    outcome: DriveResult,
    expectation: Expectation,
    ctx: &LaunchContext,
) -> DriveResult {
    outcome?;
    if expectation == Expectation::Overtime {
        return Err(ScenarioFault::assertion(format!(
            "project {} launched by participant {} finished before release; expected: overtime",
            ctx.order_key, ctx.entry_number
        )));
    }
    Ok(())
}

fn resolve_released(expectation: Expectation, ctx: &LaunchContext) -> DriveResult {
    if expectation == Expectation::NormallyDone {
        return Err(ScenarioFault::assertion(format!(
            "project {} launched by participant {} overran its release window; expected: normally done",
            ctx.order_key, ctx.entry_number
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(
        default_window: Duration,
    ) -> (LaunchContext, Arc<OutcomeLedger>, Arc<ProjectRegistry>, Arc<AtomicUsize>) {
        let ledger = Arc::new(OutcomeLedger::new());
        let registry = Arc::new(ProjectRegistry::new());
        let active = Arc::new(AtomicUsize::new(0));
        let ctx = LaunchContext {
            entry_number: 1,
            order_key: 1,
            ledger: Arc::clone(&ledger),
            registry: Arc::clone(&registry),
            active_projects: Arc::clone(&active),
            default_window,
        };
        (ctx, ledger, registry, active)
    }

    #[test]
    fn plain_body_runs_synchronously() {
        let (ctx, _, registry, active) = context(Duration::from_secs(3));
        let result = launch(ctx, |_| {
            thread::sleep(Duration::from_millis(50));
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(active.load(Ordering::SeqCst), 0);
        registry.join_all();
    }

    #[test]
    fn body_fault_propagates_inline() {
        let (ctx, _, registry, _) = context(Duration::from_secs(3));
        let result = launch(ctx, |_| Err(ScenarioFault::raised("state", "plan")));
        assert_eq!(result, Err(ScenarioFault::raised("state", "plan")));
        registry.join_all();
    }

    #[test]
    fn double_expectation_is_a_usage_fault() {
        let (ctx, _, registry, _) = context(Duration::from_secs(3));
        let result = launch(ctx, |watchdog| {
            watchdog.expect_overtime()?;
            watchdog.expect_normally_done()?;
            Ok(())
        });
        assert!(result.unwrap_err().is_usage());
        registry.join_all();
    }

    #[test]
    fn release_window_bounds_the_wait() {
        let (ctx, _, registry, active) = context(Duration::from_secs(3));
        let start = Instant::now();
        let result = launch(ctx, |watchdog| {
            watchdog.release_if_overtime(Duration::from_millis(200));
            watchdog.expect_overtime()?;
            thread::sleep(Duration::from_millis(1000));
            Ok(())
        });
        assert!(result.is_ok());
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(200), "waited {waited:?}");
        assert!(waited < Duration::from_millis(800), "waited {waited:?}");
        assert_eq!(active.load(Ordering::SeqCst), 1);
        registry.join_all();
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn released_body_fault_lands_in_ledger() {
        let (ctx, ledger, registry, _) = context(Duration::from_secs(3));
        let result = launch(ctx, |watchdog| {
            watchdog.release_if_overtime(Duration::from_millis(100));
            thread::sleep(Duration::from_millis(400));
            Err(ScenarioFault::raised("state", "late failure"))
        });
        assert!(result.is_ok());
        registry.join_all();
        let faults = ledger.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].fault.message(), "late failure");
    }
}
