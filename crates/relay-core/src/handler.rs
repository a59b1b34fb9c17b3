//! Handler capability.
//!
//! A handler consumes one [`Payload`] at a time. Any
//! `FnMut(Payload) -> Result<(), HandlerError>` closure is a handler, so most
//! callers never implement the trait by hand.

use std::error::Error as StdError;

use thiserror::Error;

use crate::payload::Payload;

/// Consumer of payloads attached to a relay.
///
/// Handlers are invoked synchronously, inline with the `deliver` or `attach`
/// call that triggered them. A returned error is propagated to that caller
/// unchanged; the relay never retries.
pub trait Handler: Send {
    /// Process one payload.
    fn on_payload(&mut self, payload: Payload) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: FnMut(Payload) -> Result<(), HandlerError> + Send,
{
    fn on_payload(&mut self, payload: Payload) -> Result<(), HandlerError> {
        self(payload)
    }
}

/// Error raised by a handler while processing a payload.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl HandlerError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Wrap an underlying error, keeping it as the error source.
    pub fn from_source<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self { message: source.to_string(), source: Some(Box::new(source)) }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
