use crate::task::Runnable;
use crossbeam_deque::Injector;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};
use tracing::trace;

/// State shared by the scheduler and every worker thread.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) shutdown: AtomicBool,

    /// Tasks sitting in some queue, not yet claimed by a thread.
    pub(crate) queued: AtomicUsize,

    /// Tasks currently executing.
    pub(crate) active: AtomicUsize,

    /// LIFO collection of parked threads. We unpark threads in LIFO order as
    /// the latest parked thread is the one where the CPU cache is the hottest.
    parked: Mutex<VecDeque<ParkedThread>>,
}

#[derive(Debug)]
struct ParkedThread {
    thread: Thread,
    should_unpark: Arc<AtomicBool>,
}

impl Shared {
    pub(crate) fn new(worker_threads: usize) -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            queued: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            parked: Mutex::new(VecDeque::with_capacity(worker_threads)),
        }
    }

    /// Parks the current worker thread until new work is announced.
    ///
    /// The injector and shutdown signals are checked *while holding the lock*:
    /// a concurrent scheduler either published its task before we looked, or
    /// will find us in the parked list when it calls unpark.
    pub(crate) fn park_current_thread(
        &self,
        should_unpark: &Arc<AtomicBool>,
        injector: &Injector<Runnable>,
    ) {
        {
            let mut parked = self.parked.lock();

            if !injector.is_empty() || self.shutdown.load(Ordering::Acquire) {
                return;
            }

            should_unpark.store(false, Ordering::Release);
            parked.push_back(ParkedThread {
                thread: thread::current(),
                should_unpark: Arc::clone(should_unpark),
            });
        }

        trace!("worker parked");

        // Spin until it is time to unpark. The loop accounts for spurious
        // wakeups and stale unpark tokens, as per `thread::park` docs.
        while !should_unpark.load(Ordering::Acquire) {
            thread::park();
        }
    }

    pub(crate) fn unpark_one_thread(&self) -> bool {
        if let Some(parked) = self.parked.lock().pop_back() {
            parked.should_unpark.store(true, Ordering::Release);
            parked.thread.unpark();
            true
        } else {
            false
        }
    }

    pub(crate) fn unpark_all_threads(&self) -> usize {
        let mut num_unparked = 0;
        let mut parked = self.parked.lock();

        while let Some(parked_thread) = parked.pop_back() {
            num_unparked += 1;
            parked_thread.should_unpark.store(true, Ordering::Release);
            parked_thread.thread.unpark();
        }

        num_unparked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(Shared: Send, Sync);

    #[test]
    fn test_unpark_on_empty_list() {
        let shared = Shared::new(2);
        assert!(!shared.unpark_one_thread());
        assert_eq!(shared.unpark_all_threads(), 0);
    }

    #[test]
    fn test_park_returns_immediately_when_injector_has_work() {
        let shared = Shared::new(1);
        let injector = Injector::new();
        let (runnable, _handle) = crate::task::new_task(|| 1);
        injector.push(runnable);

        let token = Arc::new(AtomicBool::new(true));
        // Must not block: work is visible at the predicate check.
        shared.park_current_thread(&token, &injector);
        assert!(shared.parked.lock().is_empty());
    }

    #[test]
    fn test_park_returns_immediately_on_shutdown() {
        let shared = Shared::new(1);
        let injector: Injector<Runnable> = Injector::new();
        shared.shutdown.store(true, Ordering::Release);

        let token = Arc::new(AtomicBool::new(true));
        shared.park_current_thread(&token, &injector);
        assert!(shared.parked.lock().is_empty());
    }
}
