use std::fmt;

/// A failed put. The item always comes back to the caller: the channel never
/// half-inserts, so the caller decides whether to retry, reroute or drop it.
#[derive(thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum PutError<T> {
    /// The channel was closed; the buffer was left untouched.
    #[error("channel is closed")]
    Closed(T),

    /// The timed wait expired with the buffer still full.
    #[error("timed out waiting for space in the channel")]
    Timeout(T),

    /// Non-blocking put found the buffer full.
    #[error("channel is full")]
    Full(T),
}

impl<T> PutError<T> {
    /// Recover the item that was not transferred.
    pub fn into_inner(self) -> T {
        match self {
            PutError::Closed(item) | PutError::Timeout(item) | PutError::Full(item) => item,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, PutError::Closed(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PutError::Timeout(_))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, PutError::Full(_))
    }
}

// Manual impl so `T` does not need to be `Debug`.
impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            PutError::Closed(_) => "Closed",
            PutError::Timeout(_) => "Timeout",
            PutError::Full(_) => "Full",
        };
        f.debug_tuple(kind).field(&"..").finish()
    }
}

/// A failed take. The buffer is left in a consistent state in every case.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// The channel was closed and fully drained.
    #[error("channel is closed and drained")]
    Closed,

    /// The timed wait expired with the buffer still empty.
    #[error("timed out waiting for an item")]
    Timeout,

    /// Non-blocking take found the buffer empty.
    #[error("channel is empty")]
    Empty,
}

impl TakeError {
    pub fn is_closed(&self) -> bool {
        matches!(self, TakeError::Closed)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TakeError::Timeout)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TakeError::Empty)
    }
}
