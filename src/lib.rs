pub mod channel;
pub use channel::Handoff;

pub mod divide;
pub use divide::{Problem, Threshold};

mod errors;
pub use errors::ConfigError;

pub mod runtime;
pub use runtime::{Builder, Pool};

pub mod task;
pub use task::{Id, JoinError, JoinHandle};

mod context;
