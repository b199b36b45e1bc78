//! Reusable N-party restart rendezvous.
//!
//! Every active participant blocks in [`RestartBarrier::wait`] until the last
//! one arrives, then all are released simultaneously and the barrier resets
//! for reuse later in the same scenario. Participants that reach a terminal
//! state retire from the barrier so stragglers cannot deadlock waiting for a
//! party that will never arrive.

use parking_lot::{Condvar, Mutex};

struct BarrierState {
    /// Party count the barrier was created with.
    initial: usize,
    /// Parties still eligible to arrive. Shrinks as participants retire.
    active: usize,
    /// Parties currently blocked in `wait`.
    arrived: usize,
    /// Bumped on every release; waiters watch it to survive spurious wakeups.
    generation: u64,
}

/// A reusable rendezvous for `initial` parties.
pub struct RestartBarrier {
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

impl RestartBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                initial: parties,
                active: parties,
                arrived: 0,
                generation: 0,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Block until every active party has arrived, then release all at once.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        state.arrived += 1;
        if state.arrived >= state.active {
            Self::release(&mut state);
            self.condvar.notify_all();
            return;
        }
        let generation = state.generation;
        while state.generation == generation {
            self.condvar.wait(&mut state);
        }
    }

    /// Remove one party permanently. If the remaining arrivals now satisfy
    /// the shrunken cohort, the round releases immediately.
    pub fn retire(&self) {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);
        if state.arrived > 0 && state.arrived >= state.active {
            Self::release(&mut state);
            self.condvar.notify_all();
        }
    }

    fn release(state: &mut BarrierState) {
        state.arrived = 0;
        state.generation += 1;
    }

    /// Party count at construction.
    pub fn initial_count(&self) -> usize {
        self.state.lock().initial
    }

    /// Parties still eligible to arrive.
    pub fn active_count(&self) -> usize {
        self.state.lock().active
    }
}
