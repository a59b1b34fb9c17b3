//! World state for scenario execution.
//!
//! The World owns the relay under test, the logs of every named handler, and
//! the handler errors observed while the scenario ran.

use std::collections::HashMap;

use relay_core::{PendingMessageRelay, RelayError};

use crate::recorder::Received;

/// A handler error raised by one scenario step.
#[derive(Debug)]
pub struct StepError {
    /// Index of the step that failed
    pub step: usize,
    /// The error returned by the relay
    pub error: RelayError,
}

/// World state containing the relay, handler logs and errors.
#[derive(Debug, Default)]
pub struct World {
    relay: PendingMessageRelay,
    handlers: HashMap<String, Received>,
    attach_order: Vec<String>,
    errors: Vec<StepError>,
}

impl World {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// The relay under test.
    pub fn relay(&self) -> &PendingMessageRelay {
        &self.relay
    }

    /// Mutable access to the relay under test.
    pub fn relay_mut(&mut self) -> &mut PendingMessageRelay {
        &mut self.relay
    }

    /// Register the log of a named handler.
    ///
    /// Names are unique within a world; a second handler under the same name
    /// is rejected.
    pub fn add_handler(&mut self, name: String, received: Received) -> Result<(), String> {
        if self.handlers.contains_key(&name) {
            return Err(format!("handler '{name}' attached twice"));
        }
        self.attach_order.push(name.clone());
        self.handlers.insert(name, received);
        Ok(())
    }

    /// Log of a named handler.
    pub fn received(&self, name: &str) -> Option<&Received> {
        self.handlers.get(name)
    }

    /// Handler names in attachment order.
    pub fn handler_names(&self) -> &[String] {
        &self.attach_order
    }

    /// Record a handler error raised by a step.
    pub fn record_error(&mut self, step: usize, error: RelayError) {
        self.errors.push(StepError { step, error });
    }

    /// All handler errors, in step order.
    pub fn errors(&self) -> &[StepError] {
        &self.errors
    }

    /// Payloads still buffered in the relay.
    pub fn pending_len(&self) -> usize {
        self.relay.pending_len()
    }
}
