use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

// Public API
mod errors;
pub use self::errors::JoinError;

mod join;
pub use self::join::JoinHandle;

pub mod id;
pub use self::id::Id;

// Re-exports
mod cell;
pub(crate) use self::cell::Cell;

/// Task result stored in the cell and handed to joiners.
pub(crate) type Result<T> = std::result::Result<T, JoinError>;

/// A type-erased unit of work sitting in a scheduler queue.
///
/// Consuming it either runs the closure and publishes its result, or cancels
/// it so joiners observe [`JoinError::Cancelled`] instead of hanging.
pub(crate) struct Runnable {
    job: Box<dyn Job>,
}

impl Runnable {
    pub(crate) fn run(self) {
        self.job.run();
    }

    pub(crate) fn cancel(self) {
        self.job.cancel();
    }
}

impl std::fmt::Debug for Runnable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runnable").field("id", &self.job.id()).finish()
    }
}

trait Job: Send {
    fn run(self: Box<Self>);
    fn cancel(self: Box<Self>);
    fn id(&self) -> Id;
}

struct Typed<F, T> {
    id: Id,
    f: F,
    cell: Arc<Cell<T>>,
}

impl<F, T> Job for Typed<F, T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>) {
        let Typed { id, f, cell } = *self;

        // A panicking task must surface through `join()`, never take the
        // worker thread down with it.
        let result = panic::catch_unwind(AssertUnwindSafe(f))
            .map_err(|payload| JoinError::panicked(id, payload.as_ref()));

        cell.complete(result);
    }

    fn cancel(self: Box<Self>) {
        self.cell.complete(Err(JoinError::cancelled(self.id)));
    }

    fn id(&self) -> Id {
        self.id
    }
}

/// Constructor for a new task. The `Runnable` goes to a scheduler queue, the
/// `JoinHandle` to the caller; they share the result cell.
pub(crate) fn new_task<F, T>(f: F) -> (Runnable, JoinHandle<T>)
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let id = Id::next();
    let cell = Arc::new(Cell::new());

    let runnable = Runnable {
        job: Box::new(Typed {
            id,
            f,
            cell: Arc::clone(&cell),
        }),
    };

    (runnable, JoinHandle::new(id, cell))
}

pub(crate) fn panic_payload_as_str(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}
