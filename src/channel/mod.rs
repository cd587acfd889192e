//! Bounded handoff channel with blocking put/take semantics.
//!
//! A fixed-capacity FIFO buffer coordinating any number of producer and
//! consumer threads: `put` blocks while the buffer is full, `take` blocks
//! while it is empty, and each side wakes the other. Capacity 1 gives the
//! classic single-slot handoff where producer and consumer strictly
//! alternate.
//!
//! Run-to-completion protocols layer a sentinel on top (e.g. `Option` items
//! with `None` as the DONE marker); the channel itself has no notion of a
//! final item. For cooperative teardown, [`Handoff::close`] wakes every
//! blocked thread with a [`Closed`](PutError::Closed) error and leaves the
//! buffer untouched.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::errors::ConfigError;

mod errors;
pub use errors::{PutError, TakeError};

#[cfg(test)]
mod tests;

/// Bounded blocking FIFO channel.
///
/// All operations take `&self`; share it between threads with an `Arc` (or
/// scoped-thread borrows). The buffer is exclusively owned by the channel
/// and only ever mutated under its internal lock.
pub struct Handoff<T> {
    capacity: usize,
    state: Mutex<State<T>>,

    /// Signalled when space frees up; producers wait here.
    not_full: Condvar,

    /// Signalled when an item arrives; consumers wait here.
    not_empty: Condvar,
}

struct State<T> {
    buffer: VecDeque<T>,
    closed: bool,
}

impl<T> Handoff<T> {
    /// The single-slot variant: producer and consumer strictly alternate.
    pub fn new() -> Self {
        Self::build(1)
    }

    /// A channel buffering up to `capacity` items.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Append `item`, blocking while the buffer is full.
    ///
    /// Never drops or duplicates: on failure the item travels back to the
    /// caller inside the error. All waiting consumers are woken (broadcast)
    /// so every one of them re-checks its predicate.
    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return Err(PutError::Closed(item));
            }
            if state.buffer.len() < self.capacity {
                break;
            }
            self.not_full.wait(&mut state);
        }

        state.buffer.push_back(item);
        drop(state);

        self.not_empty.notify_all();
        Ok(())
    }

    /// Like [`put`](Handoff::put), but gives up with
    /// [`PutError::Timeout`] if no space frees up within `timeout`, leaving
    /// the buffer unchanged. The channel stays fully usable afterwards.
    pub fn put_timeout(&self, item: T, timeout: Duration) -> Result<(), PutError<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return Err(PutError::Closed(item));
            }
            if state.buffer.len() < self.capacity {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(PutError::Timeout(item));
            }
            self.not_full.wait_for(&mut state, deadline - now);
        }

        state.buffer.push_back(item);
        drop(state);

        self.not_empty.notify_all();
        Ok(())
    }

    /// Non-blocking put: fails immediately when the buffer is full.
    pub fn try_put(&self, item: T) -> Result<(), PutError<T>> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(PutError::Closed(item));
        }
        if state.buffer.len() == self.capacity {
            return Err(PutError::Full(item));
        }

        state.buffer.push_back(item);
        drop(state);

        self.not_empty.notify_all();
        Ok(())
    }

    /// Remove and return the oldest item, blocking while the buffer is
    /// empty.
    ///
    /// A closed channel drains its remaining buffered items first; only an
    /// empty closed channel yields [`TakeError::Closed`].
    pub fn take(&self) -> Result<T, TakeError> {
        let mut state = self.state.lock();

        loop {
            if let Some(item) = state.buffer.pop_front() {
                drop(state);
                self.not_full.notify_all();
                return Ok(item);
            }
            if state.closed {
                return Err(TakeError::Closed);
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Like [`take`](Handoff::take), but gives up with
    /// [`TakeError::Timeout`] if nothing arrives within `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> Result<T, TakeError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        loop {
            if let Some(item) = state.buffer.pop_front() {
                drop(state);
                self.not_full.notify_all();
                return Ok(item);
            }
            if state.closed {
                return Err(TakeError::Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(TakeError::Timeout);
            }
            self.not_empty.wait_for(&mut state, deadline - now);
        }
    }

    /// Non-blocking take: fails immediately when the buffer is empty.
    pub fn try_take(&self) -> Result<T, TakeError> {
        let mut state = self.state.lock();

        if let Some(item) = state.buffer.pop_front() {
            drop(state);
            self.not_full.notify_all();
            return Ok(item);
        }

        if state.closed {
            Err(TakeError::Closed)
        } else {
            Err(TakeError::Empty)
        }
    }

    /// Close the channel, waking every blocked producer and consumer.
    ///
    /// Buffered items stay in place and remain takeable; further puts fail
    /// with their item handed back. Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);

        debug!("handoff channel closed");
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of buffered items. Observability hook; the value may be stale
    /// by the time it returns.
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for Handoff<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Handoff<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Handoff")
            .field("capacity", &self.capacity)
            .field("len", &state.buffer.len())
            .field("closed", &state.closed)
            .finish()
    }
}
