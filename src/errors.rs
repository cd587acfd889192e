/// Construction-time validation errors.
///
/// Every invalid parameter is rejected when the value is built, never when it
/// is used. A `Pool`, `Handoff` or `Threshold` that exists is always in a
/// usable configuration.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("channel capacity must be at least 1")]
    ZeroCapacity,

    #[error("worker thread count must be at least 1")]
    ZeroWorkerThreads,

    #[error("divide threshold must be at least 1")]
    ZeroThreshold,
}
