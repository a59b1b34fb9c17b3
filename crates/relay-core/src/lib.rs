//! Pending message relay
//!
//! A connection can receive data before application code has subscribed to
//! it. The relay closes that gap: payloads that arrive with nobody listening
//! are buffered, the first handler to attach receives all of them in arrival
//! order, and from then on every payload is dispatched immediately to every
//! attached handler.
//!
//! # Architecture
//!
//! Everything here is a synchronous state machine with no I/O. Transport
//! events are passed in by the caller and handler invocations happen inline
//! with the call that caused them. The WebSocket object returns declarative
//! actions that a driver executes.
//!
//! # Components
//!
//! - [`relay`]: Buffer-then-replay state machine
//! - [`shared`]: Mutex-guarded handle for multi-threaded callers
//! - [`socket`]: WebSocket connection object owning a relay
//! - [`payload`]: Immutable payload value type
//! - [`handler`]: Handler capability trait
//! - [`error`]: Relay and socket error types

#![forbid(unsafe_code)]

pub mod error;
pub mod handler;
pub mod payload;
pub mod relay;
pub mod shared;
pub mod socket;

pub use error::{RelayError, SocketError};
pub use handler::{Handler, HandlerError};
pub use payload::Payload;
pub use relay::{PendingMessageRelay, RelayState};
pub use shared::SharedRelay;
pub use socket::{SocketAction, SocketConfig, SocketState, SocketUrl, WebSocket};
