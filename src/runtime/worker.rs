use crate::runtime::{Handle, PoolConfig};
use crate::task::Runnable;
use crossbeam_deque::{Injector, Stealer, Worker as CbWorker};
use std::iter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
pub(crate) struct Worker {
    /// Local LIFO queue. Only the owning thread pushes and pops; siblings
    /// reach it through their `Stealer` handles.
    local: CbWorker<Runnable>,

    /// Global injector queue where externally spawned tasks land.
    global: Arc<Injector<Runnable>>,

    /// Handles to all of the *other* workers' local queues. If there are N
    /// workers we have N-1 queues to steal from.
    stealers: Vec<Stealer<Runnable>>,

    max_steal_retries: usize,

    /// Unpark token owned by this worker's thread.
    pub(crate) should_unpark: Arc<AtomicBool>,
}

impl Worker {
    pub(crate) fn new(
        cfg: &PoolConfig,
        global: Arc<Injector<Runnable>>,
        local: CbWorker<Runnable>,
        mut stealers: Vec<Stealer<Runnable>>,
    ) -> Self {
        // Shuffle the stealers so that each worker's search order when trying
        // to steal work is different and hopefully unique to reduce contention.
        fastrand::shuffle(&mut stealers);

        Self {
            local,
            global,
            stealers,
            max_steal_retries: cfg.max_steal_retries,
            should_unpark: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Push a freshly forked task. Only the owning thread may call this; the
    /// scheduler guarantees it by routing through the thread-local context.
    pub(crate) fn push_local(&self, task: Runnable) {
        self.local.push(task);
    }

    pub(crate) fn find_task(&self) -> Option<Runnable> {
        // 1. Always start popping from the local queue: freshly forked
        //    children, LIFO, so the CPU cache is expected to be hot.
        self.local.pop().or_else(|| {
            // 2. No local work: repeatedly try the global injector, then the
            //    other workers' queues.
            iter::repeat_with(|| {
                // A batch from the injector goes into our local queue so the
                // next iterations find work without touching the injector.
                self.global.steal_batch_and_pop(&self.local).or_else(|| {
                    // The behavior of collect here is to return the first
                    // Success(T), so *we are not* iterating through all
                    // stealers every time.
                    self.stealers.iter().map(|s| s.steal()).collect()
                })
            })
            // Scan a maximum of `max_steal_retries` rounds, otherwise give up.
            .take(self.max_steal_retries)
            .find(|s| !s.is_retry())
            .and_then(|s| s.success())
        })
    }

    pub(crate) fn event_loop(&self, handle: &Handle) {
        loop {
            if handle.shared.shutdown.load(Ordering::Acquire) {
                break;
            }

            if let Some(task) = self.find_task() {
                handle.run_task(task);
            } else {
                // Nothing anywhere: park until the scheduler announces work.
                handle
                    .shared
                    .park_current_thread(&self.should_unpark, &self.global);
            }
        }

        // Anything still in the local queue never started; resolve its
        // joiners instead of dropping them on the floor.
        while let Some(task) = self.local.pop() {
            handle.cancel_task(task);
        }

        trace!("worker exited event loop");
    }
}

// Safety: the local queue is only pushed/popped from its owning thread (the
// scheduler routes local pushes through the thread-local worker context, and
// helping joins run on the owner as well). Cross-thread access goes through
// the separate `Stealer` handles, which are safe by construction.
unsafe impl Send for Worker {}
unsafe impl Sync for Worker {}
