use crate::context;
use crate::runtime::shared::Shared;
use crate::runtime::PoolConfig;
use crate::task::{self, JoinHandle, Runnable};
use crossbeam_deque::Injector;
use std::ops::Deref;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
pub(crate) struct Scheduler {
    /// Pool configuration, injected into every worker.
    pub(crate) cfg: PoolConfig,

    /// The global injector queue for tasks spawned off-pool.
    pub(crate) injector: Arc<Injector<Runnable>>,

    /// State shared between workers and the scheduler.
    pub(crate) shared: Arc<Shared>,
}

impl Scheduler {
    pub(crate) fn new(cfg: PoolConfig) -> Self {
        let shared = Arc::new(Shared::new(cfg.worker_threads));

        Self {
            cfg,
            injector: Arc::new(Injector::new()),
            shared,
        }
    }

    pub(crate) fn into_handle(self) -> Handle {
        Handle(Arc::new(self))
    }
}

/// Cheaply cloneable reference to the scheduler, held by the pool, every
/// worker thread and every recursive task.
#[derive(Debug, Clone)]
pub(crate) struct Handle(Arc<Scheduler>);

impl Handle {
    pub(crate) fn same_pool(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn spawn<F, T>(&self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (runnable, handle) = task::new_task(f);
        trace!(task_id = %handle.id(), "spawn");

        self.schedule(runnable);
        handle
    }

    fn schedule(&self, task: Runnable) {
        self.shared.queued.fetch_add(1, Ordering::Relaxed);

        // Tasks forked on a pool thread go to that worker's local queue
        // (LIFO, cache-hot) and stay stealable by idle siblings. Everything
        // else lands on the global injector.
        let mut task = Some(task);
        if let Some(ctx) = context::current_worker() {
            if ctx.belongs_to(self) {
                if let Some(task) = task.take() {
                    ctx.worker.push_local(task);
                }
            }
        }
        if let Some(task) = task {
            self.injector.push(task);
        }

        self.shared.unpark_one_thread();
    }

    /// Run one task, keeping the pool counters honest. Used by the worker
    /// event loop and by helping joins alike.
    pub(crate) fn run_task(&self, task: Runnable) {
        self.shared.queued.fetch_sub(1, Ordering::Relaxed);
        self.shared.active.fetch_add(1, Ordering::Relaxed);

        task.run();

        self.shared.active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Resolve a task that will never run, waking its joiners with a
    /// cancellation error.
    pub(crate) fn cancel_task(&self, task: Runnable) {
        self.shared.queued.fetch_sub(1, Ordering::Relaxed);
        task.cancel();
    }
}

impl Deref for Handle {
    type Target = Arc<Scheduler>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
