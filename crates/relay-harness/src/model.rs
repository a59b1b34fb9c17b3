//! Reference model and real-system adapter for model-based testing.
//!
//! [`ModelRelay`] is a deliberately naive re-statement of the relay rules
//! over plain vectors. [`RealRelay`] drives an actual
//! [`PendingMessageRelay`] with [`Recorder`] handlers. Both accept the same
//! [`Operation`]s and expose the same [`ObservableState`], so a random
//! operation sequence can be run through both and compared.
//!
//! ```text
//! Vec<Operation>
//!       │
//!   ┌───┴───────┐
//!   ▼           ▼
//! ModelRelay  RealRelay
//!   │           │
//!   └─────┬─────┘
//!         ▼
//!  compare results + ObservableState
//! ```

use arbitrary::Arbitrary;
use relay_core::{PendingMessageRelay, RelayError};

use crate::recorder::{Received, Recorder};

/// Operation applied to a relay.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Deliver a payload
    Deliver {
        /// Raw payload bytes
        payload: Vec<u8>,
    },
    /// Attach a handler that accepts everything
    Attach,
    /// Attach a handler that fails on payloads starting with `poison`
    AttachFailing {
        /// First byte that makes the handler fail
        poison: u8,
    },
}

/// Outcome of applying an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation completed
    Ok,
    /// A handler failed
    Error(OperationError),
}

impl OperationResult {
    /// Returns true if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Handler failure, reduced to what both implementations can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// First handler failed during replay
    Replay {
        /// Arrival sequence of the payload
        sequence: u64,
    },
    /// Handler failed during live fan-out
    Dispatch {
        /// Registration index of the failing handler
        handler: usize,
        /// Arrival sequence of the payload
        sequence: u64,
    },
}

impl From<&RelayError> for OperationError {
    fn from(err: &RelayError) -> Self {
        match *err {
            RelayError::Replay { sequence, .. } => Self::Replay { sequence },
            RelayError::Dispatch { handler, sequence, .. } => Self::Dispatch { handler, sequence },
        }
    }
}

/// Externally visible state, comparable across implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Payloads still buffered, oldest first
    pub pending: Vec<Vec<u8>>,
    /// Payloads accepted by each handler, in registration order
    pub received: Vec<Vec<Vec<u8>>>,
}

fn is_poisoned(poison: Option<u8>, payload: &[u8]) -> bool {
    poison.is_some_and(|p| payload.first() == Some(&p))
}

#[derive(Debug, Clone)]
struct ModelHandler {
    poison: Option<u8>,
    received: Vec<Vec<u8>>,
}

/// Reference model of the relay.
#[derive(Debug, Clone, Default)]
pub struct ModelRelay {
    pending: Vec<Vec<u8>>,
    handlers: Vec<ModelHandler>,
    delivered: u64,
}

impl ModelRelay {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Deliver { payload } => self.deliver(payload),
            Operation::Attach => self.attach(None),
            Operation::AttachFailing { poison } => self.attach(Some(*poison)),
        }
    }

    /// Current observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            pending: self.pending.clone(),
            received: self.handlers.iter().map(|h| h.received.clone()).collect(),
        }
    }

    fn deliver(&mut self, payload: &[u8]) -> OperationResult {
        let sequence = self.delivered;
        self.delivered += 1;

        if self.handlers.is_empty() {
            self.pending.push(payload.to_vec());
            return OperationResult::Ok;
        }

        for (index, handler) in self.handlers.iter_mut().enumerate() {
            if is_poisoned(handler.poison, payload) {
                return OperationResult::Error(OperationError::Dispatch { handler: index, sequence });
            }
            handler.received.push(payload.to_vec());
        }
        OperationResult::Ok
    }

    fn attach(&mut self, poison: Option<u8>) -> OperationResult {
        let mut handler = ModelHandler { poison, received: Vec::new() };

        if !self.handlers.is_empty() {
            self.handlers.push(handler);
            return OperationResult::Ok;
        }

        let first_sequence = self.delivered - self.pending.len() as u64;
        let backlog = std::mem::take(&mut self.pending);
        let mut result = OperationResult::Ok;
        for (offset, payload) in backlog.into_iter().enumerate() {
            if is_poisoned(poison, &payload) {
                result = OperationResult::Error(OperationError::Replay {
                    sequence: first_sequence + offset as u64,
                });
                break;
            }
            handler.received.push(payload);
        }

        self.handlers.push(handler);
        result
    }
}

/// Real relay driven with recording handlers.
#[derive(Debug, Default)]
pub struct RealRelay {
    relay: PendingMessageRelay,
    logs: Vec<Received>,
}

impl RealRelay {
    /// Create an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let result = match op {
            Operation::Deliver { payload } => self.relay.deliver(payload),
            Operation::Attach => {
                let (recorder, log) = Recorder::new();
                self.logs.push(log);
                self.relay.attach(recorder)
            },
            Operation::AttachFailing { poison } => {
                let poison = *poison;
                let (recorder, log) =
                    Recorder::failing_when(move |p| is_poisoned(Some(poison), p.as_bytes()));
                self.logs.push(log);
                self.relay.attach(recorder)
            },
        };

        match result {
            Ok(()) => OperationResult::Ok,
            Err(err) => OperationResult::Error(OperationError::from(&err)),
        }
    }

    /// Current observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            pending: self.relay.pending().map(|p| p.to_vec()).collect(),
            received: self
                .logs
                .iter()
                .map(|log| log.payloads().iter().map(|p| p.to_vec()).collect())
                .collect(),
        }
    }

    /// The underlying relay.
    pub fn relay(&self) -> &PendingMessageRelay {
        &self.relay
    }
}

/// Run `ops` through the model and the real relay and compare them after
/// every step.
///
/// Returns a description of the first divergence.
pub fn check_equivalence(ops: &[Operation]) -> Result<(), String> {
    let mut model = ModelRelay::new();
    let mut real = RealRelay::new();

    for (i, op) in ops.iter().enumerate() {
        let model_result = model.apply(op);
        let real_result = real.apply(op);
        if model_result != real_result {
            return Err(format!(
                "result divergence at operation {i}: {op:?}\nmodel: {model_result:?}\nreal: {real_result:?}"
            ));
        }

        let model_state = model.observable_state();
        let real_state = real.observable_state();
        if model_state != real_state {
            return Err(format!(
                "state divergence at operation {i}: {op:?}\nmodel: {model_state:?}\nreal: {real_state:?}"
            ));
        }
    }

    Ok(())
}
