//! Work-stealing thread pool for blocking fork/join workloads.

// Public API
mod builder;
pub use builder::Builder;

mod pool;
pub use pool::Pool;

// Re-exports
pub(crate) use builder::PoolConfig;

pub(crate) mod scheduler;
pub(crate) use scheduler::Handle;

pub(crate) mod shared;

pub(crate) mod worker;

#[cfg(test)]
mod tests;
