//! Pending message relay.
//!
//! Buffers payloads that arrive before anyone is listening, then hands them
//! to the first handler that attaches, in arrival order, before any payload
//! that arrives afterwards.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────┐  first attach (replay + clear)  ┌──────┐
//! │ Buffering │────────────────────────────────>│ Live │
//! └───────────┘                                 └──────┘
//!    │  ↑                                         │  ↑
//!    └──┘ deliver: enqueue                        └──┘ deliver: fan out
//!                                                      attach: register
//! ```
//!
//! - **Buffering**: no handler ever attached. `deliver` appends to the
//!   pending queue.
//! - **Live**: at least one handler attached. The pending queue is empty and
//!   stays empty. `deliver` invokes every handler in registration order.
//!
//! The transition happens exactly once. `Live` is terminal.
//!
//! # Errors
//!
//! Handler errors propagate to the caller of `deliver` or `attach`. Fan-out
//! is fail-fast: handlers after the failing one do not see that payload.
//! Nothing is re-queued and nothing is retried.

use std::{collections::VecDeque, fmt, mem};

use tracing::{debug, trace};

use crate::{error::RelayError, handler::Handler, payload::Payload};

/// Relay lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// No handler attached yet, payloads are queued
    Buffering,
    /// Handlers attached, payloads are dispatched immediately
    Live,
}

/// Buffer-then-replay dispatcher for inbound payloads.
///
/// Single-threaded: both operations take `&mut self`. Use
/// [`crate::SharedRelay`] when deliveries come from more than one thread.
#[derive(Default)]
pub struct PendingMessageRelay {
    /// Payloads received while no handler was attached, oldest first
    pending: VecDeque<Payload>,
    /// Attached handlers, in registration order
    handlers: Vec<Box<dyn Handler>>,
    /// Number of payloads accepted so far (next arrival sequence number)
    received: u64,
}

impl PendingMessageRelay {
    /// Create an empty relay in the `Buffering` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RelayState {
        if self.handlers.is_empty() { RelayState::Buffering } else { RelayState::Live }
    }

    /// Number of payloads waiting for the first handler.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Payloads waiting for the first handler, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Payload> {
        self.pending.iter()
    }

    /// Number of attached handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Total number of payloads accepted by `deliver`.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Accept an inbound payload.
    ///
    /// The bytes are copied before anything else happens. While buffering,
    /// the copy is queued. Once live, every handler receives it in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Dispatch`] for the first handler that fails.
    /// Handlers registered after it are skipped for this payload.
    pub fn deliver(&mut self, payload: impl AsRef<[u8]>) -> Result<(), RelayError> {
        let payload = Payload::copy_from_slice(payload.as_ref());
        let sequence = self.received;
        self.received += 1;

        if self.handlers.is_empty() {
            trace!(sequence, len = payload.len(), "buffering payload");
            self.pending.push_back(payload);
            return Ok(());
        }

        trace!(sequence, handlers = self.handlers.len(), "dispatching payload");
        for (index, handler) in self.handlers.iter_mut().enumerate() {
            handler.on_payload(payload.clone()).map_err(|source| RelayError::Dispatch {
                handler: index,
                sequence,
                source,
            })?;
        }

        Ok(())
    }

    /// Register a handler.
    ///
    /// The first handler ever attached receives every buffered payload, in
    /// arrival order, before this call returns. The buffer is empty
    /// afterwards whether or not replay succeeded. Later handlers only see
    /// payloads delivered after they attach.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Replay`] if the handler fails during replay.
    /// The handler stays registered and the payloads it did not get to are
    /// dropped.
    pub fn attach<H>(&mut self, handler: H) -> Result<(), RelayError>
    where
        H: Handler + 'static,
    {
        let first = self.handlers.is_empty();
        self.handlers.push(Box::new(handler));

        if !first {
            debug!(handlers = self.handlers.len(), "handler attached");
            return Ok(());
        }

        let backlog = mem::take(&mut self.pending);
        let first_sequence = self.received - backlog.len() as u64;
        debug!(replay = backlog.len(), "relay live");

        let Some(handler) = self.handlers.last_mut() else {
            return Ok(());
        };
        for (offset, payload) in backlog.into_iter().enumerate() {
            let sequence = first_sequence + offset as u64;
            handler
                .on_payload(payload)
                .map_err(|source| RelayError::Replay { sequence, source })?;
        }

        Ok(())
    }
}

impl fmt::Debug for PendingMessageRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMessageRelay")
            .field("state", &self.state())
            .field("pending", &self.pending)
            .field("handlers", &self.handlers.len())
            .field("received", &self.received)
            .finish()
    }
}
