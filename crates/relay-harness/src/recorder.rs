//! Recording handlers.
//!
//! A [`Recorder`] is a handler that appends every payload it accepts to a
//! shared [`Received`] log. Tests keep the log and hand the recorder to the
//! relay.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use relay_core::{Handler, HandlerError, Payload};

type Poison = Box<dyn Fn(&Payload) -> bool + Send>;

/// Shared log of payloads accepted by a [`Recorder`].
#[derive(Debug, Clone, Default)]
pub struct Received(Arc<Mutex<Vec<Payload>>>);

impl Received {
    /// Snapshot of the accepted payloads, in order.
    pub fn payloads(&self) -> Vec<Payload> {
        self.lock().clone()
    }

    /// Number of accepted payloads.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been accepted.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether the log equals `expected`, byte for byte.
    pub fn matches(&self, expected: &[&[u8]]) -> bool {
        let log = self.lock();
        log.len() == expected.len() && log.iter().zip(expected).all(|(got, want)| got == *want)
    }

    fn push(&self, payload: Payload) {
        self.lock().push(payload);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Payload>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handler that records payloads, optionally rejecting some.
pub struct Recorder {
    received: Received,
    poison: Option<Poison>,
}

impl Recorder {
    /// A recorder that accepts everything.
    pub fn new() -> (Self, Received) {
        let received = Received::default();
        (Self { received: received.clone(), poison: None }, received)
    }

    /// A recorder that fails on payloads matching `poison`.
    ///
    /// Rejected payloads are not recorded.
    pub fn failing_when<F>(poison: F) -> (Self, Received)
    where
        F: Fn(&Payload) -> bool + Send + 'static,
    {
        let received = Received::default();
        (Self { received: received.clone(), poison: Some(Box::new(poison)) }, received)
    }

    /// A recorder that fails on payloads equal to `bad`.
    pub fn failing_on(bad: impl Into<Vec<u8>>) -> (Self, Received) {
        let bad = bad.into();
        Self::failing_when(move |payload| payload.as_bytes() == bad.as_slice())
    }
}

impl Handler for Recorder {
    fn on_payload(&mut self, payload: Payload) -> Result<(), HandlerError> {
        if self.poison.as_ref().is_some_and(|poison| poison(&payload)) {
            return Err(HandlerError::new(format!("rejected payload {payload}")));
        }
        self.received.push(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let (mut recorder, received) = Recorder::new();
        recorder.on_payload(Payload::from(b"a")).unwrap();
        recorder.on_payload(Payload::from(b"b\x00")).unwrap();

        assert!(received.matches(&[b"a", b"b\x00"]));
        assert_eq!(received.len(), 2);
    }

    #[test]
    fn failing_on_rejects_only_matching() {
        let (mut recorder, received) = Recorder::failing_on(*b"bad");
        assert!(recorder.on_payload(Payload::from(b"bad")).is_err());
        recorder.on_payload(Payload::from(b"good")).unwrap();

        assert!(received.matches(&[b"good"]));
    }
}
