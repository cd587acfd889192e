//! Recursive divide-and-conquer execution on top of the pool.
//!
//! The caller supplies the decomposition: how to measure a problem, how to
//! split it, how to solve a small one directly and how to combine two
//! sub-results. The pool supplies the parallelism. Combine order is
//! *structural* (left child before right child, as created by `split`),
//! never completion order, so ordered outputs like concatenations come out
//! deterministic no matter which worker finished first.

use crate::errors::ConfigError;
use crate::runtime::Handle;
use crate::task::JoinError;
use std::num::NonZeroUsize;


/// A recursively decomposable problem.
///
/// The implementation contract:
/// - `split` is only called on problems with `size() > 1` above the
///   threshold, and must produce the left part first;
/// - `solve` is the sequential base case; on an empty problem it must return
///   the identity of `combine` (e.g. `i64::MIN` for max, an empty vec for
///   concatenation);
/// - `combine` merges sibling results and must respect the structural
///   left/right order it is given.
pub trait Problem: Sized + Send + 'static {
    type Output: Send + 'static;

    /// Problem size, the unit the threshold is compared against.
    fn size(&self) -> usize;

    /// Split into (left, right) sub-problems of roughly equal size.
    fn split(self) -> (Self, Self);

    /// Sequential base case.
    fn solve(self) -> Self::Output;

    /// Merge two sub-results, left structural child first.
    fn combine(left: Self::Output, right: Self::Output) -> Self::Output;
}

/// Validated problem-size threshold below which a task solves directly.
///
/// Constructing the threshold is where the validation lives: a `Threshold`
/// that exists is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(NonZeroUsize);

impl Threshold {
    pub fn new(value: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or(ConfigError::ZeroThreshold)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Submit the root task and block the caller until the tree completes.
pub(crate) fn invoke<P: Problem>(
    handle: &Handle,
    problem: P,
    threshold: Threshold,
) -> Result<P::Output, JoinError> {
    let scheduler = handle.clone();
    let root = handle.spawn(move || compute(&scheduler, problem, threshold));

    root.into_result()
}

/// The fork/join recursion, running inside a pool task.
///
/// Splits into two children, forks the left one onto the pool and solves the
/// right one inline so this worker never sits idle, then joins the fork.
/// A failed child is re-raised, so the failure reaches the root join with no
/// default value substituted anywhere along the way.
fn compute<P: Problem>(scheduler: &Handle, problem: P, threshold: Threshold) -> P::Output {
    // A problem that cannot subdivide (size <= 1) is always a base case,
    // whatever the threshold says.
    if problem.size() <= 1 || problem.size() <= threshold.get() {
        return problem.solve();
    }

    let (left, right) = problem.split();

    let forked = {
        let scheduler_for_child = scheduler.clone();
        scheduler.spawn(move || compute(&scheduler_for_child, left, threshold))
    };

    let right_output = compute(scheduler, right, threshold);

    // Join order is structural: the forked left child is combined first even
    // if the inline right half finished long before it.
    match forked.into_result() {
        Ok(left_output) => P::combine(left_output, right_output),
        Err(err) => err.resume(),
    }
}
