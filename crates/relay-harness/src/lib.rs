//! Deterministic test harness for the pending message relay.
//!
//! Recording handlers, a reference model, scripted scenarios with mandatory
//! oracles, and seeded workloads for reproducible soak runs.

#![forbid(unsafe_code)]

pub mod model;
pub mod recorder;
pub mod scenario;
pub mod workload;

pub use model::{
    ModelRelay, ObservableState, Operation, OperationError, OperationResult, RealRelay,
    check_equivalence,
};
pub use recorder::{Received, Recorder};
pub use workload::Workload;
