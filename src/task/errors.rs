use crate::task::{panic_payload_as_str, Id};
use std::any::Any;
use std::panic;

/// Returned when joining a task did not produce a value.
///
/// The error is `Clone` so that repeated `join()` calls on the same handle
/// observe the identical outcome; panic payloads are captured as their
/// message rather than the raw `Box<dyn Any>`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// The task body panicked. The panic was caught on the worker and must
    /// not be masked by a default value; parents re-raise it.
    #[error("task {id} panicked: {msg}")]
    Panicked { id: Id, msg: String },

    /// The pool shut down before the task ever started running.
    #[error("task {id} was cancelled before it ran")]
    Cancelled { id: Id },

    /// A timed join expired. The task keeps running in the background and a
    /// later join may still succeed.
    #[error("timed out waiting for task {id}")]
    Timeout { id: Id },
}

impl JoinError {
    pub(crate) fn panicked(id: Id, payload: &(dyn Any + Send)) -> Self {
        let msg = panic_payload_as_str(payload)
            .unwrap_or("<non-string panic payload>")
            .to_owned();
        JoinError::Panicked { id, msg }
    }

    pub(crate) fn cancelled(id: Id) -> Self {
        JoinError::Cancelled { id }
    }

    pub(crate) fn timeout(id: Id) -> Self {
        JoinError::Timeout { id }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, JoinError::Panicked { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JoinError::Cancelled { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, JoinError::Timeout { .. })
    }

    /// The ID of the task this error refers to.
    pub fn id(&self) -> Id {
        match self {
            JoinError::Panicked { id, .. }
            | JoinError::Cancelled { id }
            | JoinError::Timeout { id } => *id,
        }
    }

    /// Re-raise on the current thread. Used by a parent task whose child
    /// failed: the parent's own `catch_unwind` then records the failure, so
    /// it travels join by join up to the root caller.
    pub(crate) fn resume(self) -> ! {
        panic::resume_unwind(Box::new(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_message_is_captured() {
        let id = Id::next();
        let payload: Box<dyn Any + Send> = Box::new("boom".to_string());
        let err = JoinError::panicked(id, payload.as_ref());

        assert!(err.is_panic());
        assert_eq!(err.id(), id);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_error_kinds_are_disjoint() {
        let id = Id::next();
        assert!(JoinError::cancelled(id).is_cancelled());
        assert!(!JoinError::cancelled(id).is_timeout());
        assert!(JoinError::timeout(id).is_timeout());
        assert!(!JoinError::timeout(id).is_panic());
    }
}
