use crate::context;
use crate::task::{Cell, Id, Result};
use crate::task::JoinError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a helping worker blocks on the target cell when it finds no other
/// task to run. A steal attempt can spuriously report empty while a sibling
/// is mid-push, so the worker re-scans the queues at this interval rather
/// than sleeping until completion.
const HELP_RECHECK_INTERVAL: Duration = Duration::from_millis(1);

/// An owned permission to join on a task (block until its result is
/// available).
///
/// This is the pool equivalent of [`std::thread::JoinHandle`]. The task
/// started the moment it was spawned; dropping the handle *detaches* the
/// task, which keeps running with its result discarded.
///
/// Joining is idempotent: once the task is `Done`, every further
/// [`join`](JoinHandle::join) returns the identical stored result without
/// recomputation.
///
/// When `join` is called on a pool worker thread, the worker does not sit
/// idle: it keeps running other queued tasks until the target completes, so
/// recursive fork/join chains can never starve the pool.
pub struct JoinHandle<T> {
    id: Id,
    cell: Arc<Cell<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(id: Id, cell: Arc<Cell<T>>) -> Self {
        Self { id, cell }
    }

    /// Returns the [`Id`] of the task this handle refers to.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Whether the task has reached its terminal state. A finished task
    /// holds either a value or a [`JoinError`]; `join` on it returns
    /// immediately.
    pub fn is_finished(&self) -> bool {
        self.cell.is_finished()
    }

    /// Block until the task completes and return a copy of its result.
    ///
    /// Calling `join` again on the same handle (or on the handle after a
    /// failed `join_timeout`) returns the same result again.
    pub fn join(&self) -> Result<T>
    where
        T: Clone,
    {
        self.wait_finished();
        self.cell.clone_result()
    }

    /// Like [`join`](JoinHandle::join), but gives up after `timeout`.
    ///
    /// On expiry the task keeps running in the background; the handle stays
    /// usable and a later join may still succeed.
    pub fn join_timeout(&self, timeout: Duration) -> Result<T>
    where
        T: Clone,
    {
        if self.wait_deadline(Instant::now() + timeout) {
            self.cell.clone_result()
        } else {
            Err(JoinError::timeout(self.id))
        }
    }

    /// Block until the task completes and move its result out, consuming the
    /// handle. The only way to join a non-`Clone` output.
    pub fn into_result(self) -> Result<T> {
        self.wait_finished();
        self.cell.take_result()
    }

    fn wait_finished(&self) {
        match context::current_worker() {
            // On a pool thread: help drive the pool forward while we wait.
            Some(ctx) => {
                while !self.cell.is_finished() {
                    match ctx.worker.find_task() {
                        Some(task) => ctx.handle.run_task(task),
                        None => {
                            self.cell.wait_for(HELP_RECHECK_INTERVAL);
                        }
                    }
                }
            }
            None => self.cell.wait(),
        }
    }

    /// Returns whether the task finished before the deadline.
    fn wait_deadline(&self, deadline: Instant) -> bool {
        match context::current_worker() {
            Some(ctx) => {
                while !self.cell.is_finished() {
                    if Instant::now() >= deadline {
                        return false;
                    }
                    match ctx.worker.find_task() {
                        Some(task) => ctx.handle.run_task(task),
                        None => {
                            let wait = HELP_RECHECK_INTERVAL.min(
                                deadline.saturating_duration_since(Instant::now()),
                            );
                            self.cell.wait_for(wait);
                        }
                    }
                }
                true
            }
            None => self.cell.wait_until(deadline),
        }
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("JoinHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}
