//! Built-in replay checks.
//!
//! The `check` command runs a fixed catalogue of scripted scenarios; the
//! `soak` command runs a seeded random workload through the relay and the
//! reference model and stops at the first divergence.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use relay_core::RelayState;
use relay_harness::{
    Workload, check_equivalence,
    scenario::{RunnableScenario, Scenario, oracle},
};
use thiserror::Error;
use tracing::{debug, info};

/// Payloads buffered before the handler attaches.
pub const QUEUED: [&[u8]; 3] = [b"alpha", b"beta\x00gamma", b"\x00\xff\x10z"];

/// Payloads delivered after the handler attaches.
pub const LIVE: [&[u8]; 2] = [b"live-1", b"live\x00two"];

/// Errors reported by the checks.
#[derive(Debug, Error)]
pub enum CheckError {
    /// A named scenario's oracle rejected the run
    #[error("check failed: {0}")]
    Scenario(String),

    /// The filter matched no check
    #[error("no check named {0:?}")]
    UnknownCheck(String),

    /// Relay and model disagreed during a soak run
    #[error("soak run with seed {seed} diverged: {detail}")]
    Divergence {
        /// Workload seed, for reproduction
        seed: u64,
        /// Description of the divergence
        detail: String,
    },
}

/// Names of all built-in checks, in run order.
pub fn check_names() -> Vec<String> {
    catalogue().iter().map(|check| check.name().to_string()).collect()
}

fn catalogue() -> Vec<RunnableScenario> {
    let replay_then_live: Vec<&[u8]> = QUEUED.iter().chain(LIVE.iter()).copied().collect();

    vec![
        Scenario::new("pending-replay").deliver_all(QUEUED).attach("h").oracle(oracle::all_of(
            vec![oracle::received_exactly("h", &QUEUED), oracle::pending_empty()],
        )),
        Scenario::new("live-dispatch")
            .attach("h")
            .deliver_all(LIVE)
            .oracle(oracle::received_exactly("h", &LIVE)),
        Scenario::new("replay-then-live")
            .deliver_all(QUEUED)
            .attach("h")
            .deliver_all(LIVE)
            .oracle(oracle::all_of(vec![
                oracle::received_exactly("h", &replay_then_live),
                oracle::pending_empty(),
                oracle::relay_state(RelayState::Live),
            ])),
        Scenario::new("binary-integrity")
            .deliver(b"")
            .deliver(b"\x00")
            .deliver([0u8, 0, 0, 0xff])
            .attach("h")
            .oracle(oracle::received_exactly("h", &[b"", b"\x00", b"\x00\x00\x00\xff"])),
        Scenario::new("late-handler")
            .deliver_all(QUEUED)
            .attach("first")
            .attach("second")
            .deliver_all(LIVE)
            .oracle(oracle::all_of(vec![
                oracle::received_exactly("first", &replay_then_live),
                oracle::received_exactly("second", &LIVE),
            ])),
        Scenario::new("fail-fast")
            .attach("a")
            .attach_failing("b", b"poison")
            .attach("c")
            .deliver(b"poison")
            .oracle(oracle::all_of(vec![
                oracle::dispatch_failed(3, 1),
                oracle::received_exactly("a", &[b"poison"]),
                oracle::received_nothing("c"),
            ])),
    ]
}

/// Run the built-in checks, or only the one named `only`.
///
/// Returns the number of checks that passed.
pub fn run_checks(only: Option<&str>) -> Result<usize, CheckError> {
    let selected: Vec<RunnableScenario> = catalogue()
        .into_iter()
        .filter(|check| only.is_none_or(|name| check.name() == name))
        .collect();

    if selected.is_empty() {
        return Err(CheckError::UnknownCheck(only.unwrap_or_default().to_string()));
    }

    let mut passed = 0;
    for check in selected {
        let name = check.name().to_string();
        check.run().map_err(CheckError::Scenario)?;
        info!(check = %name, "passed");
        passed += 1;
    }

    Ok(passed)
}

/// Run `operations` seeded random operations through relay and model.
pub fn soak(seed: u64, operations: usize) -> Result<(), CheckError> {
    let mut workload = Workload::seeded(seed);
    let ops = workload.operations(operations);
    debug!(seed = workload.seed(), operations, "soak workload generated");

    check_equivalence(&ops).map_err(|detail| CheckError::Divergence { seed, detail })?;
    info!(seed, operations, "soak run matched model");
    Ok(())
}
