//! Thread-safe relay handle.
//!
//! [`SharedRelay`] wraps a [`PendingMessageRelay`] in a mutex and holds the
//! lock for the full duration of `deliver` and `attach`, handler invocations
//! included. That makes the first `attach` (register, replay, clear) atomic
//! with respect to concurrent deliveries: a payload either lands in the
//! buffer before the replay snapshot or is dispatched live afterwards, never
//! both and never neither.
//!
//! Handlers must not call back into the same `SharedRelay`; the lock is not
//! re-entrant.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    error::RelayError,
    handler::Handler,
    relay::{PendingMessageRelay, RelayState},
};

/// Cloneable, thread-safe handle to a single relay.
#[derive(Debug, Clone, Default)]
pub struct SharedRelay {
    inner: Arc<Mutex<PendingMessageRelay>>,
}

impl SharedRelay {
    /// Create a handle to a new, empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`PendingMessageRelay::deliver`].
    pub fn deliver(&self, payload: impl AsRef<[u8]>) -> Result<(), RelayError> {
        self.lock().deliver(payload)
    }

    /// See [`PendingMessageRelay::attach`].
    pub fn attach<H>(&self, handler: H) -> Result<(), RelayError>
    where
        H: Handler + 'static,
    {
        self.lock().attach(handler)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RelayState {
        self.lock().state()
    }

    /// Number of payloads waiting for the first handler.
    pub fn pending_len(&self) -> usize {
        self.lock().pending_len()
    }

    /// Number of attached handlers.
    pub fn handler_count(&self) -> usize {
        self.lock().handler_count()
    }

    // A handler that panicked leaves the relay consistent: bookkeeping is
    // complete before each handler call.
    fn lock(&self) -> MutexGuard<'_, PendingMessageRelay> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<PendingMessageRelay> for SharedRelay {
    fn from(relay: PendingMessageRelay) -> Self {
        Self { inner: Arc::new(Mutex::new(relay)) }
    }
}
