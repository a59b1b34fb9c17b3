//! Relay and socket error types.

use thiserror::Error;

use crate::{handler::HandlerError, socket::SocketState};

/// Errors surfaced by [`crate::PendingMessageRelay`].
///
/// The relay has no failure modes of its own. Every variant carries the
/// [`HandlerError`] of the handler that failed, plus enough context to tell
/// which payload and which handler were involved.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The first handler failed while buffered payloads were replayed to it.
    ///
    /// Replay stops at the failing payload. The buffer is already cleared.
    #[error("replay of payload #{sequence} failed")]
    Replay {
        /// Arrival sequence number of the payload being replayed
        sequence: u64,
        /// Error returned by the handler
        #[source]
        source: HandlerError,
    },

    /// A handler failed during live fan-out.
    ///
    /// Handlers registered after the failing one did not see the payload.
    #[error("handler {handler} failed on payload #{sequence}")]
    Dispatch {
        /// Registration index of the failing handler
        handler: usize,
        /// Arrival sequence number of the payload
        sequence: u64,
        /// Error returned by the handler
        #[source]
        source: HandlerError,
    },
}

impl RelayError {
    /// The handler error behind this failure.
    pub fn handler_error(&self) -> &HandlerError {
        match self {
            Self::Replay { source, .. } | Self::Dispatch { source, .. } => source,
        }
    }
}

/// Errors from the [`crate::socket::WebSocket`] connection object.
#[derive(Debug, Error)]
pub enum SocketError {
    /// URL rejected before any connection attempt
    #[error("invalid WebSocket URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Operation not allowed in the current state
    #[error("cannot {operation} in state {state:?}")]
    InvalidState {
        /// Current socket state
        state: SocketState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// A message handler failed
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// An open/close signal handler failed
    #[error("{signal} handler {handler} failed")]
    Signal {
        /// Which signal was firing
        signal: &'static str,
        /// Registration index of the failing handler
        handler: usize,
        /// Error returned by the handler
        #[source]
        source: HandlerError,
    },
}
