use crate::context::init_worker_context;
use crate::divide::{self, Problem, Threshold};
use crate::runtime::scheduler::{Handle, Scheduler};
use crate::runtime::worker::Worker;
use crate::runtime::{Builder, PoolConfig};
use crate::task::{JoinError, JoinHandle};
use anyhow::{anyhow, Result};
use crossbeam_deque::{Steal, Worker as CbWorker};
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use tracing::debug;

/// A work-stealing pool of OS worker threads executing closure tasks.
///
/// Tasks are cooperative units of work, not threads: thousands of tasks may
/// run over a handful of workers. Tasks forked from inside the pool go to the
/// forking worker's own queue and are stolen by idle siblings, which keeps
/// recursive divide-and-conquer workloads balanced without any tuning.
///
/// Dropping the pool shuts it down: running tasks finish, queued tasks that
/// never started resolve to [`JoinError::Cancelled`] for anyone joining them.
pub struct Pool {
    pub(crate) handle: Handle,
    threads: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl Pool {
    /// A pool with default configuration (one worker per core).
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn new(cfg: PoolConfig) -> Self {
        let handle = Scheduler::new(cfg).into_handle();
        let num_workers = handle.cfg.worker_threads;

        // Create crossbeam LIFO queues and their stealers.
        let mut local_queues = Vec::with_capacity(num_workers);
        let mut stealers = Vec::with_capacity(num_workers);

        for _ in 0..num_workers {
            let w = CbWorker::new_lifo();
            stealers.push(w.stealer());
            local_queues.push(w);
        }

        let workers = local_queues
            .into_iter()
            .enumerate()
            .map(|(i, local)| {
                // Give each worker a list of all *other* workers' stealers.
                let other_stealers = stealers
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, s)| s.clone())
                    .collect::<Vec<_>>();

                Arc::new(Worker::new(
                    &handle.cfg,
                    handle.injector.clone(),
                    local,
                    other_stealers,
                ))
            })
            .collect::<Vec<_>>();

        // Spawning threads is async: wait for every worker to come up before
        // the pool accepts work.
        let barrier = Arc::new(Barrier::new(num_workers + 1));
        let threads = workers
            .into_iter()
            .map(|worker| spawn_worker_thread(handle.clone(), worker, barrier.clone()))
            .collect::<Vec<_>>();

        barrier.wait();

        Self {
            handle,
            threads: Mutex::new(threads),
        }
    }

    /// Enqueue a closure for execution by a worker thread and return
    /// immediately.
    pub fn spawn<F, T>(&self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.handle.spawn(f)
    }

    /// Run a divide-and-conquer [`Problem`] to completion on the pool,
    /// blocking the calling thread until the combined result is ready.
    ///
    /// See the [`divide`](crate::divide) module for the decomposition
    /// contract and ordering guarantees.
    pub fn invoke<P: Problem>(
        &self,
        problem: P,
        threshold: Threshold,
    ) -> Result<P::Output, JoinError> {
        divide::invoke(&self.handle, problem, threshold)
    }

    pub fn worker_threads(&self) -> usize {
        self.handle.cfg.worker_threads
    }

    /// Number of tasks sitting in queues, not yet started. Observability
    /// hook; the value is already stale when it returns.
    pub fn queued_tasks(&self) -> usize {
        self.handle.shared.queued.load(Ordering::Relaxed)
    }

    /// Number of tasks currently executing on some thread.
    pub fn active_tasks(&self) -> usize {
        self.handle.shared.active.load(Ordering::Relaxed)
    }

    /// Shut the pool down and join its threads.
    ///
    /// Running tasks complete normally. Tasks that never started are
    /// cancelled, so their joiners observe [`JoinError::Cancelled`] rather
    /// than hanging forever.
    pub fn shutdown(self) -> Result<()> {
        self.shutdown_inner()
    }

    fn shutdown_inner(&self) -> Result<()> {
        self.handle.shared.shutdown.store(true, Ordering::Release);
        self.handle.shared.unpark_all_threads();
        debug!("pool shutting down");

        let panicked = {
            let mut threads = self.threads.lock();
            threads
                .drain(..)
                .map(|handle| handle.join())
                .filter(Result::is_err)
                .count()
        };

        // Tasks that were pushed to the injector but never claimed. Workers
        // drained their own local queues on the way out.
        loop {
            match self.handle.injector.steal() {
                Steal::Success(task) => self.handle.cancel_task(task),
                Steal::Empty => break,
                Steal::Retry => continue,
            }
        }

        if panicked == 0 {
            Ok(())
        } else {
            Err(anyhow!("{} worker thread(s) panicked", panicked))
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        // Idempotent: after an explicit `shutdown()` the thread list and the
        // injector are already empty.
        let _ = self.shutdown_inner();
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("worker_threads", &self.worker_threads())
            .field("queued_tasks", &self.queued_tasks())
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

fn spawn_worker_thread(
    handle: Handle,
    worker: Arc<Worker>,
    barrier: Arc<Barrier>,
) -> thread::JoinHandle<()> {
    let mut builder = thread::Builder::new().name((handle.cfg.thread_name.0)());

    if let Some(stack_size) = handle.cfg.thread_stack_size {
        builder = builder.stack_size(stack_size);
    }

    builder
        .spawn(move || {
            init_worker_context(handle.clone(), Arc::clone(&worker));
            barrier.wait();

            worker.event_loop(&handle);
        })
        .expect("failed to spawn worker thread")
}
