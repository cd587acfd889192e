use crate::errors::ConfigError;
use crate::runtime::Pool;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// How many times a worker will loop over the global injector queue and the
/// other workers' queues to try and find work before parking.
const MAX_STEAL_RETRIES: usize = 3;

#[derive(Clone)]
pub(crate) struct ThreadNameFn(pub(crate) Arc<dyn Fn() -> String + Send + Sync + 'static>);

fn default_thread_name_fn() -> ThreadNameFn {
    let worker_count = Arc::new(AtomicUsize::new(0));

    ThreadNameFn(Arc::new(move || {
        let id = worker_count.fetch_add(1, Ordering::Relaxed);
        format!("forkolo-{}", id)
    }))
}

impl fmt::Debug for ThreadNameFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The closure itself is not printable.
        f.debug_tuple("ThreadNameFn").field(&"<function>").finish()
    }
}

/// Validated configuration injected into the scheduler and workers.
#[derive(Debug, Clone)]
pub(crate) struct PoolConfig {
    pub(crate) worker_threads: usize,

    pub(crate) thread_name: ThreadNameFn,

    pub(crate) thread_stack_size: Option<usize>,

    pub(crate) max_steal_retries: usize,
}

/// Builds a [`Pool`] with custom configuration.
///
/// ```
/// use forkolo::Builder;
///
/// let pool = Builder::new()
///     .worker_threads(4)
///     .thread_name("my-pool")
///     .try_build()
///     .unwrap();
/// assert_eq!(pool.worker_threads(), 4);
/// ```
#[derive(Debug)]
pub struct Builder {
    /// The number of worker threads. Defaults to 1 per core.
    worker_threads: Option<usize>,

    /// Name fn used for threads spawned by the pool.
    thread_name: ThreadNameFn,

    /// Stack size used for threads spawned by the pool.
    thread_stack_size: Option<usize>,

    max_steal_retries: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            worker_threads: None,
            thread_name: default_thread_name_fn(),
            thread_stack_size: None,
            max_steal_retries: MAX_STEAL_RETRIES,
        }
    }

    /// Sets the number of worker threads. Zero is rejected by
    /// [`try_build`](Builder::try_build).
    pub fn worker_threads(&mut self, val: usize) -> &mut Self {
        self.worker_threads = Some(val);
        self
    }

    /// Sets the name of threads spawned by the pool.
    ///
    /// The default name is "forkolo-{N}".
    pub fn thread_name(&mut self, val: impl Into<String>) -> &mut Self {
        let val = val.into();
        self.thread_name = ThreadNameFn(Arc::new(move || val.clone()));
        self
    }

    /// Sets a function used to generate the name of threads spawned by the
    /// pool.
    pub fn thread_name_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.thread_name = ThreadNameFn(Arc::new(f));
        self
    }

    /// Sets the stack size (in bytes) for worker threads.
    ///
    /// The actual stack size may be greater than this value if the platform
    /// specifies a minimal stack size.
    pub fn thread_stack_size(&mut self, val: usize) -> &mut Self {
        self.thread_stack_size = Some(val);
        self
    }

    /// How many scan rounds a worker runs over the injector and its siblings'
    /// queues before deciding it found nothing and parking.
    ///
    /// # Panics
    ///
    /// Panics if 0 is passed as an argument.
    pub fn max_steal_retries(&mut self, val: usize) -> &mut Self {
        assert!(val > 0, "max_steal_retries must be greater than 0");
        self.max_steal_retries = val;
        self
    }

    /// Creates the configured [`Pool`], spawning its worker threads.
    ///
    /// Fails fast with [`ConfigError`] on invalid parameters; a built pool is
    /// always ready to accept tasks.
    pub fn try_build(&mut self) -> Result<Pool, ConfigError> {
        let worker_threads = match self.worker_threads {
            Some(0) => return Err(ConfigError::ZeroWorkerThreads),
            Some(n) => n,
            None => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        };

        Ok(Pool::new(PoolConfig {
            worker_threads,
            thread_name: self.thread_name.clone(),
            thread_stack_size: self.thread_stack_size,
            max_steal_retries: self.max_steal_retries,
        }))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
