//! Reusable oracle functions.
//!
//! Each helper returns an [`OracleFn`]; combine them with [`all_of`].

use relay_core::{RelayError, RelayState};

use crate::scenario::OracleFn;

/// Every oracle in `oracles` must pass. Stops at the first failure.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| oracles.iter().try_for_each(|oracle| oracle(world)))
}

/// The named handler accepted exactly `expected`, in order.
pub fn received_exactly(name: &str, expected: &[&[u8]]) -> OracleFn {
    let name = name.to_string();
    let expected: Vec<Vec<u8>> = expected.iter().map(|p| p.to_vec()).collect();

    Box::new(move |world| {
        let received = world.received(&name).ok_or_else(|| format!("no handler named {name}"))?;
        let got: Vec<Vec<u8>> = received.payloads().iter().map(|p| p.to_vec()).collect();
        if got == expected {
            Ok(())
        } else {
            Err(format!("handler {name} received {got:?}, expected {expected:?}"))
        }
    })
}

/// The named handler accepted nothing.
pub fn received_nothing(name: &str) -> OracleFn {
    received_exactly(name, &[])
}

/// The relay buffer is empty.
pub fn pending_empty() -> OracleFn {
    pending_count(0)
}

/// The relay buffer holds exactly `count` payloads.
pub fn pending_count(count: usize) -> OracleFn {
    Box::new(move |world| {
        let pending = world.pending_len();
        if pending == count {
            Ok(())
        } else {
            Err(format!("expected {count} pending payloads, found {pending}"))
        }
    })
}

/// The relay is in `state`.
pub fn relay_state(state: RelayState) -> OracleFn {
    Box::new(move |world| {
        let actual = world.relay().state();
        if actual == state { Ok(()) } else { Err(format!("relay is {actual:?}, expected {state:?}")) }
    })
}

/// No step raised a handler error.
pub fn no_errors() -> OracleFn {
    Box::new(|world| match world.errors().first() {
        None => Ok(()),
        Some(failure) => Err(format!("step {} failed: {}", failure.step, failure.error)),
    })
}

/// Step `step` raised a dispatch error from handler index `handler`.
pub fn dispatch_failed(step: usize, handler: usize) -> OracleFn {
    Box::new(move |world| {
        let found = world.errors().iter().any(|failure| {
            failure.step == step
                && matches!(failure.error, RelayError::Dispatch { handler: h, .. } if h == handler)
        });
        if found {
            Ok(())
        } else {
            Err(format!("no dispatch failure from handler {handler} at step {step}"))
        }
    })
}

/// Step `step` raised a replay error.
pub fn replay_failed(step: usize) -> OracleFn {
    Box::new(move |world| {
        let found = world
            .errors()
            .iter()
            .any(|failure| failure.step == step && matches!(failure.error, RelayError::Replay { .. }));
        if found { Ok(()) } else { Err(format!("no replay failure at step {step}")) }
    })
}
