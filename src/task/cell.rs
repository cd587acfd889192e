use crate::task::Result;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Single-writer result slot shared between a task and its `JoinHandle`.
///
/// Exactly one worker writes the result (under the lock, followed by a
/// broadcast); after that the cell is logically immutable and may be read by
/// any number of joiners. `finished` stays true even after the value is moved
/// out by a consuming join.
pub(crate) struct Cell<T> {
    state: Mutex<State<T>>,
    done: Condvar,
}

struct State<T> {
    finished: bool,
    result: Option<Result<T>>,
}

impl<T> Cell<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                finished: false,
                result: None,
            }),
            done: Condvar::new(),
        }
    }

    /// Publish the task outcome and wake every waiting joiner.
    pub(crate) fn complete(&self, result: Result<T>) {
        let mut state = self.state.lock();
        debug_assert!(!state.finished, "task completed twice");

        state.result = Some(result);
        state.finished = true;
        drop(state);

        self.done.notify_all();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Block until the task reaches its terminal state.
    pub(crate) fn wait(&self) {
        let mut state = self.state.lock();
        while !state.finished {
            self.done.wait(&mut state);
        }
    }

    /// Block until the task finishes or the deadline passes. Returns whether
    /// the task is finished.
    pub(crate) fn wait_until(&self, deadline: Instant) -> bool {
        let mut state = self.state.lock();
        while !state.finished {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.done.wait_for(&mut state, deadline - now);
        }
        true
    }

    /// Bounded wait used by helping joins between queue scans. Returns
    /// whether the task is finished.
    pub(crate) fn wait_for(&self, timeout: Duration) -> bool {
        self.wait_until(Instant::now() + timeout)
    }

    /// Read the stored result. Caller must have observed `finished`.
    pub(crate) fn clone_result(&self) -> Result<T>
    where
        T: Clone,
    {
        let state = self.state.lock();
        debug_assert!(state.finished);
        state
            .result
            .clone()
            .expect("task result already moved out of the cell")
    }

    /// Move the stored result out. Caller must have observed `finished` and
    /// hold the only consuming handle.
    pub(crate) fn take_result(&self) -> Result<T> {
        let mut state = self.state.lock();
        debug_assert!(state.finished);
        state
            .result
            .take()
            .expect("task result already moved out of the cell")
    }
}
