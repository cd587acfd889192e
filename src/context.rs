use crate::runtime::scheduler::Handle;
use crate::runtime::worker::Worker;
use std::cell::RefCell;
use std::sync::Arc;
use std::thread_local;

/// Everything a pool thread knows about itself. Installed once at thread
/// startup, before the worker enters its event loop.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) handle: Handle,
    pub(crate) worker: Arc<Worker>,
}

impl WorkerContext {
    /// Whether this thread belongs to the pool behind `handle`. Queues must
    /// never be crossed between pools.
    pub(crate) fn belongs_to(&self, handle: &Handle) -> bool {
        self.handle.same_pool(handle)
    }
}

thread_local! {
    static CONTEXT: RefCell<Option<WorkerContext>> = const { RefCell::new(None) };
}

pub(crate) fn init_worker_context(handle: Handle, worker: Arc<Worker>) {
    CONTEXT.with(|ctx| {
        let mut slot = ctx.borrow_mut();
        debug_assert!(slot.is_none(), "worker context initialized twice");
        *slot = Some(WorkerContext { handle, worker });
    });
}

/// The current thread's worker context, if this is a pool thread.
pub(crate) fn current_worker() -> Option<WorkerContext> {
    CONTEXT.with(|ctx| ctx.borrow().clone())
}
