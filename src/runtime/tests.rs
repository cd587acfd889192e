use super::*;
use crate::channel::Handoff;
use crate::errors::ConfigError;
use anyhow::Result;
use static_assertions::assert_impl_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

assert_impl_all!(Pool: Send, Sync);
assert_impl_all!(Builder: Send, Sync);

#[test]
fn test_zero_worker_threads_is_rejected() {
    let err = Builder::new().worker_threads(0).try_build().unwrap_err();
    assert_eq!(err, ConfigError::ZeroWorkerThreads);
}

#[test]
fn test_builder_thread_naming() -> Result<()> {
    let pool = Builder::new()
        .worker_threads(2)
        .thread_name("naming-test")
        .try_build()?;

    let name = pool
        .spawn(|| thread::current().name().map(String::from))
        .into_result()
        .unwrap();
    assert_eq!(name.as_deref(), Some("naming-test"));

    pool.shutdown()
}

#[test]
fn test_spawn_returns_value() -> Result<()> {
    let pool = Builder::new().worker_threads(2).try_build()?;

    let handle = pool.spawn(|| 5 + 3);
    assert_eq!(handle.join().unwrap(), 8);

    pool.shutdown()
}

#[test]
fn test_spawn_many_tasks_all_complete() -> Result<()> {
    let pool = Builder::new().worker_threads(4).try_build()?;
    let counter = Arc::new(AtomicUsize::new(0));

    let handles = (0..500)
        .map(|i| {
            let counter = Arc::clone(&counter);
            pool.spawn(move || {
                counter.fetch_add(1, Ordering::Relaxed);
                i * 2
            })
        })
        .collect::<Vec<_>>();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.into_result().unwrap(), i * 2);
    }
    assert_eq!(counter.load(Ordering::Relaxed), 500);

    pool.shutdown()
}

#[test]
fn test_join_is_idempotent() -> Result<()> {
    let pool = Builder::new().worker_threads(1).try_build()?;
    let computations = Arc::new(AtomicUsize::new(0));

    let handle = {
        let computations = Arc::clone(&computations);
        pool.spawn(move || {
            computations.fetch_add(1, Ordering::Relaxed);
            vec!["a", "b"]
        })
    };

    let first = handle.join().unwrap();
    let second = handle.join().unwrap();

    assert_eq!(first, second);
    assert_eq!(computations.load(Ordering::Relaxed), 1, "no recomputation");

    pool.shutdown()
}

#[test]
fn test_panic_surfaces_through_join() -> Result<()> {
    let pool = Builder::new().worker_threads(1).try_build()?;

    let handle = pool.spawn(|| -> i32 { panic!("boom") });
    let err = handle.join().unwrap_err();

    assert!(err.is_panic());
    assert!(err.to_string().contains("boom"));

    // The worker survived the panic.
    assert_eq!(pool.spawn(|| 1).join().unwrap(), 1);

    pool.shutdown()
}

#[test]
fn test_join_timeout_leaves_task_running() -> Result<()> {
    let pool = Builder::new().worker_threads(1).try_build()?;
    let gate = Arc::new(Handoff::new());

    let handle = {
        let gate = Arc::clone(&gate);
        pool.spawn(move || gate.take().unwrap())
    };

    // The task is blocked on the gate, so the timed join must expire.
    let err = handle.join_timeout(Duration::from_millis(50)).unwrap_err();
    assert!(err.is_timeout());
    assert!(!handle.is_finished());

    // Fire-and-forget until we decide otherwise: release the gate and the
    // same handle joins normally.
    gate.put(42).unwrap();
    assert_eq!(handle.join().unwrap(), 42);

    pool.shutdown()
}

#[test]
fn test_nested_spawn_join_on_single_worker() -> Result<()> {
    // One worker, a task joining its own children: the worker must help run
    // the children instead of deadlocking.
    let pool = Builder::new().worker_threads(1).try_build()?;
    let inner = pool.handle.clone();

    let handle = pool.spawn(move || {
        let child = inner.spawn(|| 21);
        child.join().unwrap() * 2
    });

    assert_eq!(handle.join().unwrap(), 42);
    pool.shutdown()
}

#[test]
fn test_shutdown_cancels_queued_tasks() -> Result<()> {
    let pool = Builder::new().worker_threads(1).try_build()?;
    let gate = Arc::new(Handoff::new());

    // Occupy the only worker.
    let blocker = {
        let gate = Arc::clone(&gate);
        pool.spawn(move || gate.take().unwrap())
    };
    while pool.active_tasks() == 0 {
        thread::yield_now();
    }

    // This one stays queued behind the busy worker.
    let victim = pool.spawn(|| 7);
    assert_eq!(pool.queued_tasks(), 1);

    // Release the gate only after shutdown has been initiated, so the worker
    // observes the shutdown flag before it could ever claim the victim.
    let releaser = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            gate.put(0).unwrap();
        })
    };
    pool.shutdown()?;
    releaser.join().unwrap();

    assert_eq!(blocker.join().unwrap(), 0);
    let err = victim.join().unwrap_err();
    assert!(err.is_cancelled());

    Ok(())
}

#[test]
fn test_drop_shuts_the_pool_down() -> Result<()> {
    let observed = {
        let pool = Builder::new().worker_threads(2).try_build()?;
        let handle = pool.spawn(|| "done");
        let value = handle.join().unwrap();
        drop(pool);
        value
    };
    assert_eq!(observed, "done");
    Ok(())
}

#[test]
fn test_task_counters_settle_to_zero() -> Result<()> {
    let pool = Builder::new().worker_threads(2).try_build()?;

    let handles = (0..50).map(|i| pool.spawn(move || i)).collect::<Vec<_>>();
    for handle in handles {
        handle.into_result().unwrap();
    }

    // Every spawned task was claimed and ran to completion.
    while pool.active_tasks() != 0 || pool.queued_tasks() != 0 {
        thread::yield_now();
    }

    pool.shutdown()
}

#[test]
fn test_unrelated_pools_do_not_share_queues() -> Result<()> {
    let a = Builder::new().worker_threads(1).try_build()?;
    let b = Builder::new().worker_threads(1).try_build()?;
    let b_handle = b.handle.clone();

    // A task on pool A spawning onto pool B: the task must land on B's
    // injector, not on A's local queue.
    let handle = a.spawn(move || b_handle.spawn(|| 9).join().unwrap());
    assert_eq!(handle.join().unwrap(), 9);

    a.shutdown()?;
    b.shutdown()
}
