//! Scenario-based testing with mandatory oracles.
//!
//! A scenario is a scripted sequence of deliveries and handler attachments
//! run against one relay. Every scenario must end with an oracle: a function
//! that inspects the final [`World`] and decides whether the run was correct.
//! A scenario without an oracle cannot be run.
//!
//! ```
//! use relay_harness::scenario::{Scenario, oracle};
//!
//! let result = Scenario::new("replay")
//!     .deliver(b"alpha")
//!     .attach("h")
//!     .oracle(oracle::all_of(vec![
//!         oracle::received_exactly("h", &[b"alpha"]),
//!         oracle::pending_empty(),
//!     ]))
//!     .run();
//! assert!(result.is_ok());
//! ```

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario, Step};
pub use world::{StepError, World};

/// Verification function run against the final world.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
